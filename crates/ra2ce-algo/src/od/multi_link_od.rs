use super::optimal_route::{find_routes, OdNodes, OdRouteRecord, OdRoutesResult};
use crate::redundancy::multi_link::disrupted_edges;
use crate::redundancy::round3;
use crate::weighing::WeighingAnalysis;
use anyhow::Result;
use polars::prelude::{DataFrame, NamedFrom, Series};
use ra2ce_core::config::OriginsDestinationsSection;
use ra2ce_core::inputs::OdTable;
use ra2ce_core::{EdgeMask, NodeId, OdLabels, RoadNetwork};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Spread of the route weight increase over the pairs that stay connected.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IncreaseStats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub median: f64,
}

impl IncreaseStats {
    /// NaN everywhere when `values` holds no finite number.
    fn of(values: &[f64]) -> Self {
        let mut values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return Self {
                max: f64::NAN,
                min: f64::NAN,
                mean: f64::NAN,
                median: f64::NAN,
            };
        }
        values.sort_by(f64::total_cmp);
        let n = values.len();
        let median = if n % 2 == 0 {
            (values[n / 2 - 1] + values[n / 2]) / 2.0
        } else {
            values[n / 2]
        };
        Self {
            max: values[n - 1],
            min: values[0],
            mean: values.iter().sum::<f64>() / n as f64,
            median,
        }
    }
}

/// How one hazard event changes OD accessibility.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardImpact {
    pub hazard: String,
    pub od_disconnected: usize,
    pub od_disconnected_pc: f64,
    pub origins_disconnected: usize,
    pub origins_disconnected_pc: f64,
    pub destinations_disconnected: usize,
    pub destinations_disconnected_pc: f64,
    pub increase: IncreaseStats,
    pub increase_pc: IncreaseStats,
}

/// Route weight of one OD pair before and during each event.
#[derive(Debug, Clone, PartialEq)]
pub struct PairImpact {
    pub o_node: NodeId,
    pub d_node: NodeId,
    pub origin: String,
    pub destination: String,
    pub weight: f64,
    /// One entry per hazard; `None` when the event disconnects the pair.
    pub disrupted: Vec<Option<f64>>,
}

impl PairImpact {
    pub fn diff(&self, event: usize) -> f64 {
        self.disrupted[event].map_or(f64::NAN, |w| round3(w - self.weight))
    }

    pub fn diff_pc(&self, event: usize) -> f64 {
        let diff = self.diff(event);
        if self.weight > 0.0 {
            round3(diff / self.weight * 100.0)
        } else {
            f64::NAN
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultiLinkOdResult {
    pub weighing: &'static str,
    pub hazards: Vec<String>,
    pub baseline: Vec<OdRouteRecord>,
    /// Routes under each event, grouped by hazard.
    pub routes: Vec<OdRouteRecord>,
    pub impacts: Vec<HazardImpact>,
    pub pairs: Vec<PairImpact>,
}

impl MultiLinkOdResult {
    pub fn routes_for<'a>(
        &'a self,
        hazard: &'a str,
    ) -> impl Iterator<Item = &'a OdRouteRecord> + 'a {
        self.routes
            .iter()
            .filter(move |route| route.hazard.as_deref() == Some(hazard))
    }

    pub fn impact(&self, hazard: &str) -> Option<&HazardImpact> {
        self.impacts.iter().find(|impact| impact.hazard == hazard)
    }

    /// Routes of every event with the `hazard` column.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        OdRoutesResult {
            weighing: self.weighing,
            routes: self.routes.clone(),
        }
        .to_dataframe()
    }

    /// One row per event.
    pub fn impact_dataframe(&self) -> Result<DataFrame> {
        let rows = &self.impacts;
        let w = self.weighing;
        let float = |name: String, f: &dyn Fn(&HazardImpact) -> f64| {
            Series::new(&name, rows.iter().map(f).collect::<Vec<_>>())
        };
        let count = |name: &str, f: &dyn Fn(&HazardImpact) -> usize| {
            Series::new(name, rows.iter().map(|r| f(r) as u64).collect::<Vec<_>>())
        };
        let columns = vec![
            Series::new(
                "hazard",
                rows.iter().map(|r| r.hazard.clone()).collect::<Vec<_>>(),
            ),
            count("od_disconnected", &|r| r.od_disconnected),
            float("od_disconnected_pc".into(), &|r| r.od_disconnected_pc),
            count("origins_disconnected", &|r| r.origins_disconnected),
            float("origins_disconnected_pc".into(), &|r| r.origins_disconnected_pc),
            count("destinations_disconnected", &|r| r.destinations_disconnected),
            float("destinations_disconnected_pc".into(), &|r| {
                r.destinations_disconnected_pc
            }),
            float(format!("max_increase_{w}"), &|r| r.increase.max),
            float(format!("min_increase_{w}"), &|r| r.increase.min),
            float(format!("mean_increase_{w}"), &|r| r.increase.mean),
            float(format!("median_increase_{w}"), &|r| r.increase.median),
            float(format!("max_increase_{w}_pc"), &|r| r.increase_pc.max),
            float(format!("min_increase_{w}_pc"), &|r| r.increase_pc.min),
            float(format!("mean_increase_{w}_pc"), &|r| r.increase_pc.mean),
            float(format!("median_increase_{w}_pc"), &|r| r.increase_pc.median),
        ];
        Ok(DataFrame::new(columns)?)
    }

    /// One row per baseline pair with `<w>_<hazard>`, `diff_<w>_<hazard>`
    /// and `diff_<w>_<hazard>_pc` for every event.
    pub fn pairs_dataframe(&self) -> Result<DataFrame> {
        let pairs = &self.pairs;
        let w = self.weighing;
        let mut columns = vec![
            Series::new(
                "o_node",
                pairs.iter().map(|p| p.o_node.value()).collect::<Vec<_>>(),
            ),
            Series::new(
                "d_node",
                pairs.iter().map(|p| p.d_node.value()).collect::<Vec<_>>(),
            ),
            Series::new(
                "origin",
                pairs.iter().map(|p| p.origin.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "destination",
                pairs.iter().map(|p| p.destination.clone()).collect::<Vec<_>>(),
            ),
            Series::new(w, pairs.iter().map(|p| p.weight).collect::<Vec<_>>()),
        ];
        for (event, hazard) in self.hazards.iter().enumerate() {
            columns.push(Series::new(
                &format!("{w}_{hazard}"),
                pairs.iter().map(|p| p.disrupted[event]).collect::<Vec<_>>(),
            ));
            columns.push(Series::new(
                &format!("diff_{w}_{hazard}"),
                pairs.iter().map(|p| p.diff(event)).collect::<Vec<_>>(),
            ));
            columns.push(Series::new(
                &format!("diff_{w}_{hazard}_pc"),
                pairs.iter().map(|p| p.diff_pc(event)).collect::<Vec<_>>(),
            ));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Distinct labels of one group over the route ends.
fn labels_in_group<'a>(
    labels: impl Iterator<Item = &'a str>,
    group: &str,
) -> BTreeSet<String> {
    labels
        .flat_map(|joined| OdLabels::parse(joined).iter().cloned().collect::<Vec<_>>())
        .filter(|id| id.belongs_to(group))
        .map(|id| id.to_string())
        .collect()
}

/// Label pairs a route stands for: origins times destinations at its ends.
fn od_pair_count(route: &OdRouteRecord, section: &OriginsDestinationsSection) -> usize {
    let origins = labels_in_group([route.origin.as_str()].into_iter(), &section.origins_names);
    let destinations = labels_in_group(
        [route.destination.as_str()].into_iter(),
        &section.destinations_names,
    );
    origins.len().max(1) * destinations.len().max(1)
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round3(part as f64 / whole as f64 * 100.0)
    }
}

fn impact_of(
    hazard: &str,
    event: usize,
    baseline: &[OdRouteRecord],
    disrupted: &[OdRouteRecord],
    pairs: &[PairImpact],
    section: &OriginsDestinationsSection,
) -> HazardImpact {
    let od_before: usize = baseline.iter().map(|r| od_pair_count(r, section)).sum();
    let od_after: usize = disrupted.iter().map(|r| od_pair_count(r, section)).sum();

    let origins = |routes: &[OdRouteRecord]| {
        labels_in_group(routes.iter().map(|r| r.origin.as_str()), &section.origins_names)
    };
    let destinations = |routes: &[OdRouteRecord]| {
        labels_in_group(
            routes.iter().map(|r| r.destination.as_str()),
            &section.destinations_names,
        )
    };
    let (origins_before, origins_after) = (origins(baseline).len(), origins(disrupted).len());
    let (destinations_before, destinations_after) =
        (destinations(baseline).len(), destinations(disrupted).len());

    let od_disconnected = od_before.saturating_sub(od_after);
    let origins_disconnected = origins_before.saturating_sub(origins_after);
    let destinations_disconnected = destinations_before.saturating_sub(destinations_after);

    let diffs: Vec<f64> = pairs.iter().map(|p| p.diff(event)).collect();
    let diffs_pc: Vec<f64> = pairs.iter().map(|p| p.diff_pc(event)).collect();

    HazardImpact {
        hazard: hazard.to_string(),
        od_disconnected,
        od_disconnected_pc: percentage(od_disconnected, od_before),
        origins_disconnected,
        origins_disconnected_pc: percentage(origins_disconnected, origins_before),
        destinations_disconnected,
        destinations_disconnected_pc: percentage(destinations_disconnected, destinations_before),
        increase: IncreaseStats::of(&diffs),
        increase_pc: IncreaseStats::of(&diffs_pc),
    }
}

/// Optimal OD routes under every hazard event.
///
/// Each event removes all edges it disrupts at once and reroutes every OD
/// pair; pairs that lose their last route drop out of the event's routes.
pub fn multi_link_od(
    network: &RoadNetwork,
    section: &OriginsDestinationsSection,
    table: Option<&OdTable>,
    weighing: &WeighingAnalysis,
    hazards: &[String],
    threshold: f64,
) -> MultiLinkOdResult {
    let nodes = OdNodes::from_network(network, section, table);
    let pairs = nodes.pairs();
    let baseline = find_routes(network, &EdgeMask::none(network), weighing, &pairs, None);
    info!(
        hazards = hazards.len(),
        pairs = pairs.len(),
        routes = baseline.len(),
        "multi-link OD analysis started"
    );

    let per_event: Vec<Vec<OdRouteRecord>> = hazards
        .par_iter()
        .map(|hazard| {
            let mask = disrupted_edges(network, hazard, threshold);
            let routes = find_routes(network, &mask, weighing, &pairs, Some(hazard.as_str()));
            debug!(
                hazard = %hazard,
                removed = mask.removed_count(),
                routes = routes.len(),
                "routes recomputed"
            );
            routes
        })
        .collect();

    let mut pair_impacts: Vec<PairImpact> = baseline
        .iter()
        .map(|route| PairImpact {
            o_node: route.o_node,
            d_node: route.d_node,
            origin: route.origin.clone(),
            destination: route.destination.clone(),
            weight: route.weight,
            disrupted: Vec::with_capacity(hazards.len()),
        })
        .collect();
    for routes in &per_event {
        let lookup: HashMap<(NodeId, NodeId), f64> = routes
            .iter()
            .map(|r| ((r.o_node, r.d_node), r.weight))
            .collect();
        for pair in pair_impacts.iter_mut() {
            let weight = lookup.get(&(pair.o_node, pair.d_node)).copied();
            pair.disrupted.push(weight);
        }
    }

    let impacts: Vec<HazardImpact> = hazards
        .iter()
        .zip(&per_event)
        .enumerate()
        .map(|(event, (hazard, routes))| {
            let impact = impact_of(hazard, event, &baseline, routes, &pair_impacts, section);
            info!(
                hazard = %hazard,
                od_disconnected = impact.od_disconnected,
                origins_disconnected = impact.origins_disconnected,
                destinations_disconnected = impact.destinations_disconnected,
                "hazard impact on OD routes"
            );
            impact
        })
        .collect();

    MultiLinkOdResult {
        weighing: weighing.column(),
        hazards: hazards.to_vec(),
        baseline,
        routes: per_event.into_iter().flatten().collect(),
        impacts,
        pairs: pair_impacts,
    }
}
