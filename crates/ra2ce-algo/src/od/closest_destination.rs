//! Closest destination per origin, optionally per destination category.
//!
//! Every origin is routed to the nearest node of a target set, as if all
//! targets were joined to one super sink. Each run is keyed by the hazard
//! it was computed under, `noHaz` for the undisrupted network, and records:
//!
//! - `<key>_A` on origins: `access`, `no access`, or `disrupted destination`
//!   when the closest destination is itself hit by the hazard
//! - `<key>_P` on edges and destinations: people routed over them
//!
//! An origin whose closest destination is disrupted is not rerouted to the
//! next one and its people are not counted on the route.
//!
//! With a category attribute configured the keys become `<key>_<category>`
//! and every category gets its own closest destination.

use crate::redundancy::multi_link::disrupted_edges;
use crate::redundancy::round3;
use crate::weighing::WeighingAnalysis;
use anyhow::Result;
use polars::prelude::{DataFrame, NamedFrom, Series};
use ra2ce_core::config::OriginsDestinationsSection;
use ra2ce_core::inputs::OdTable;
use ra2ce_core::routing::shortest_path_to_any;
use ra2ce_core::{
    AttrValue, EdgeIndex, EdgeMask, NodeId, NodeIndex, Ra2ceError, Ra2ceResult, RoadNetwork,
    RoadNode, Route,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Key of the run on the undisrupted network.
pub const NO_HAZARD: &str = "noHaz";

const ACCESS: &str = "access";
const NO_ACCESS: &str = "no access";
const DISRUPTED_DESTINATION: &str = "disrupted destination";

/// An origin node and the people leaving it.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginNode {
    pub index: NodeIndex,
    pub node: NodeId,
    /// Origin labels of the node, comma-joined.
    pub label: String,
    pub people: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct TargetSet {
    category: Option<String>,
    nodes: Vec<NodeIndex>,
}

/// Route of one origin to its closest destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestRoute {
    pub destination: NodeId,
    pub weight: f64,
    pub path: Vec<NodeId>,
}

/// Outcome of one origin in one run.
#[derive(Debug, Clone, PartialEq)]
pub enum Reach {
    Route(ClosestRoute),
    /// The closest destination is disrupted by the hazard at the node.
    DisruptedDestination(ClosestRoute),
    NoPath,
}

impl Reach {
    /// The route when the origin has access.
    pub fn route(&self) -> Option<&ClosestRoute> {
        match self {
            Reach::Route(route) => Some(route),
            _ => None,
        }
    }

    pub fn has_access(&self) -> bool {
        matches!(self, Reach::Route(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Reach::Route(_) => ACCESS,
            Reach::DisruptedDestination(_) => DISRUPTED_DESTINATION,
            Reach::NoPath => NO_ACCESS,
        }
    }

    fn destination(&self) -> Option<NodeId> {
        match self {
            Reach::Route(route) | Reach::DisruptedDestination(route) => Some(route.destination),
            Reach::NoPath => None,
        }
    }
}

/// One routing pass: one hazard key, one destination category.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestRun {
    pub key: String,
    pub hazard: Option<String>,
    pub category: Option<String>,
    /// Aligned with [`ClosestDestinationResult::origins`].
    pub reach: Vec<Reach>,
    pub edge_people: BTreeMap<EdgeIndex, f64>,
    pub destination_people: BTreeMap<NodeId, f64>,
    /// Destinations taken out by the hazard at the destination itself.
    pub disrupted_destinations: BTreeSet<NodeId>,
}

impl ClosestRun {
    /// Column prefix, e.g. `noHaz` or `EV1_ma_hospital`.
    pub fn column(&self) -> String {
        match &self.category {
            Some(category) => format!("{}_{category}", self.key),
            None => self.key.clone(),
        }
    }

    pub fn origins_without_access(&self) -> usize {
        self.reach.iter().filter(|reach| !reach.has_access()).count()
    }

    pub fn origins_with_disrupted_destination(&self) -> usize {
        self.reach
            .iter()
            .filter(|reach| matches!(reach, Reach::DisruptedDestination(_)))
            .count()
    }
}

/// Per-run access summary.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessSummary {
    pub key: String,
    pub category: Option<String>,
    pub origins_with_access: usize,
    /// Includes the origins counted in `origins_disrupted_destination`.
    pub origins_without_access: usize,
    pub origins_disrupted_destination: usize,
    pub people_with_access: f64,
    pub people_without_access: f64,
    pub destinations_disrupted: usize,
    pub mean_weight: f64,
}

#[derive(Debug, Clone)]
pub struct ClosestDestinationResult {
    pub weighing: &'static str,
    pub origins: Vec<OriginNode>,
    pub destinations: Vec<(NodeId, String)>,
    pub runs: Vec<ClosestRun>,
}

impl ClosestDestinationResult {
    pub fn run(&self, key: &str, category: Option<&str>) -> Option<&ClosestRun> {
        self.runs
            .iter()
            .find(|run| run.key == key && run.category.as_deref() == category)
    }

    pub fn summary(&self) -> Vec<AccessSummary> {
        self.runs
            .iter()
            .map(|run| {
                let mut people_with = 0.0;
                let mut people_without = 0.0;
                let mut weights = Vec::new();
                for (origin, reach) in self.origins.iter().zip(&run.reach) {
                    match reach.route() {
                        Some(route) => {
                            people_with += origin.people;
                            weights.push(route.weight);
                        }
                        None => people_without += origin.people,
                    }
                }
                let mean_weight = if weights.is_empty() {
                    f64::NAN
                } else {
                    round3(weights.iter().sum::<f64>() / weights.len() as f64)
                };
                AccessSummary {
                    key: run.key.clone(),
                    category: run.category.clone(),
                    origins_with_access: weights.len(),
                    origins_without_access: run.origins_without_access(),
                    origins_disrupted_destination: run.origins_with_disrupted_destination(),
                    people_with_access: people_with,
                    people_without_access: people_without,
                    destinations_disrupted: run.disrupted_destinations.len(),
                    mean_weight,
                }
            })
            .collect()
    }

    /// Origins with `<col>_A`, `<col>_destination` and `<col>_<w>` per run.
    /// Hazard runs with an undisrupted counterpart add `<col>_difference`.
    pub fn origins_dataframe(&self) -> Result<DataFrame> {
        let w = self.weighing;
        let mut columns = vec![
            Series::new(
                "o_node",
                self.origins.iter().map(|o| o.node.value()).collect::<Vec<_>>(),
            ),
            Series::new(
                "origin",
                self.origins.iter().map(|o| o.label.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "people",
                self.origins.iter().map(|o| o.people).collect::<Vec<_>>(),
            ),
        ];
        for run in &self.runs {
            let col = run.column();
            columns.push(Series::new(
                &format!("{col}_A"),
                run.reach.iter().map(Reach::label).collect::<Vec<_>>(),
            ));
            columns.push(Series::new(
                &format!("{col}_destination"),
                run.reach
                    .iter()
                    .map(|r| r.destination().map(|d| d.value()))
                    .collect::<Vec<_>>(),
            ));
            columns.push(Series::new(
                &format!("{col}_{w}"),
                run.reach
                    .iter()
                    .map(|r| r.route().map(|r| r.weight))
                    .collect::<Vec<_>>(),
            ));
            if run.hazard.is_some() {
                if let Some(base) = self.run(NO_HAZARD, run.category.as_deref()) {
                    columns.push(Series::new(
                        &format!("{col}_difference"),
                        run.reach
                            .iter()
                            .zip(&base.reach)
                            .map(|(r, b)| match (r.route(), b.route()) {
                                (Some(r), Some(b)) => Some(round3(r.weight - b.weight)),
                                _ => None,
                            })
                            .collect::<Vec<_>>(),
                    ));
                }
            }
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Edges carrying people in any run, with `<col>_P` per run.
    pub fn edges_dataframe(&self, network: &RoadNetwork) -> Result<DataFrame> {
        let used: BTreeSet<EdgeIndex> = self
            .runs
            .iter()
            .flat_map(|run| run.edge_people.keys().copied())
            .collect();
        let views: Vec<_> = used.iter().filter_map(|e| network.edge_view(*e)).collect();
        let mut columns = vec![
            Series::new("u", views.iter().map(|e| e.u.value()).collect::<Vec<_>>()),
            Series::new("v", views.iter().map(|e| e.v.value()).collect::<Vec<_>>()),
            Series::new("key", views.iter().map(|e| e.key as u64).collect::<Vec<_>>()),
            Series::new(
                "link_id",
                views.iter().map(|e| e.data.link_id_label()).collect::<Vec<_>>(),
            ),
        ];
        for run in &self.runs {
            columns.push(Series::new(
                &format!("{}_P", run.column()),
                views
                    .iter()
                    .map(|e| run.edge_people.get(&e.index).copied().unwrap_or(0.0))
                    .collect::<Vec<_>>(),
            ));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Destinations with `<col>_P` per run and `<col>_disrupted` for hazard runs.
    pub fn destinations_dataframe(&self) -> Result<DataFrame> {
        let dests = &self.destinations;
        let mut columns = vec![
            Series::new("d_node", dests.iter().map(|(n, _)| n.value()).collect::<Vec<_>>()),
            Series::new(
                "destination",
                dests.iter().map(|(_, l)| l.clone()).collect::<Vec<_>>(),
            ),
        ];
        for run in &self.runs {
            let col = run.column();
            columns.push(Series::new(
                &format!("{col}_P"),
                dests
                    .iter()
                    .map(|(n, _)| run.destination_people.get(n).copied().unwrap_or(0.0))
                    .collect::<Vec<_>>(),
            ));
            if run.hazard.is_some() {
                columns.push(Series::new(
                    &format!("{col}_disrupted"),
                    dests
                        .iter()
                        .map(|(n, _)| i32::from(run.disrupted_destinations.contains(n)))
                        .collect::<Vec<_>>(),
                ));
            }
        }
        Ok(DataFrame::new(columns)?)
    }

    pub fn summary_dataframe(&self) -> Result<DataFrame> {
        let rows = self.summary();
        let columns = vec![
            Series::new("hazard", rows.iter().map(|r| r.key.clone()).collect::<Vec<_>>()),
            Series::new(
                "category",
                rows.iter().map(|r| r.category.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "origins_with_access",
                rows.iter().map(|r| r.origins_with_access as u64).collect::<Vec<_>>(),
            ),
            Series::new(
                "origins_without_access",
                rows.iter().map(|r| r.origins_without_access as u64).collect::<Vec<_>>(),
            ),
            Series::new(
                "origins_disrupted_destination",
                rows.iter()
                    .map(|r| r.origins_disrupted_destination as u64)
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "people_with_access",
                rows.iter().map(|r| r.people_with_access).collect::<Vec<_>>(),
            ),
            Series::new(
                "people_without_access",
                rows.iter().map(|r| r.people_without_access).collect::<Vec<_>>(),
            ),
            Series::new(
                "destinations_disrupted",
                rows.iter().map(|r| r.destinations_disrupted as u64).collect::<Vec<_>>(),
            ),
            Series::new(
                &format!("mean_{}", self.weighing),
                rows.iter().map(|r| r.mean_weight).collect::<Vec<_>>(),
            ),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

/// People leaving an origin node: the `origin_count` attribute when present,
/// otherwise the OD table values of its labels (one per label without a
/// table), scaled by `origin_out_fraction`.
fn origin_people(
    node: &RoadNode,
    section: &OriginsDestinationsSection,
    table: Option<&OdTable>,
) -> f64 {
    let counted = section
        .origin_count
        .as_deref()
        .and_then(|attribute| node.numeric(attribute));
    let people = counted.unwrap_or_else(|| {
        let labels = node
            .od_ids
            .iter()
            .filter(|id| id.belongs_to(&section.origins_names));
        match table {
            Some(table) => labels
                .filter_map(|id| table.origin(id))
                .map(|record| record.values)
                .sum(),
            None => labels.count() as f64,
        }
    });
    people * section.origin_out_fraction
}

fn group_label(node: &RoadNode, group: &str) -> String {
    node.od_ids
        .iter()
        .filter(|id| id.belongs_to(group))
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn category_of(node: &RoadNode, attribute: &str) -> Option<String> {
    match node.attributes.get(attribute)? {
        AttrValue::Text(text) => Some(text.clone()),
        AttrValue::Number(value) if value.fract() == 0.0 => Some(format!("{}", *value as i64)),
        AttrValue::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn target_sets(
    network: &RoadNetwork,
    destinations: &[NodeIndex],
    section: &OriginsDestinationsSection,
) -> Vec<TargetSet> {
    let Some(attribute) = section.category.as_deref() else {
        return vec![TargetSet {
            category: None,
            nodes: destinations.to_vec(),
        }];
    };
    let mut categories: BTreeMap<String, Vec<NodeIndex>> = BTreeMap::new();
    for index in destinations {
        match category_of(network.node(*index), attribute) {
            Some(category) => categories.entry(category).or_default().push(*index),
            None => warn!(
                node = %network.node_id(*index),
                attribute,
                "destination without category, skipped"
            ),
        }
    }
    categories
        .into_iter()
        .map(|(category, nodes)| TargetSet {
            category: Some(category),
            nodes,
        })
        .collect()
}

/// Destinations whose own hazard value exceeds `threshold`.
fn disrupted_destinations(
    network: &RoadNetwork,
    destinations: &[NodeIndex],
    hazard: &str,
    threshold: f64,
) -> Ra2ceResult<HashSet<NodeIndex>> {
    let mut disrupted = HashSet::new();
    for index in destinations {
        let node = network.node(*index);
        let value = node.numeric(hazard).ok_or_else(|| {
            Ra2ceError::Config(format!(
                "destination node {} has no '{hazard}' value for threshold_destinations",
                node.id
            ))
        })?;
        if value > threshold {
            disrupted.insert(*index);
        }
    }
    Ok(disrupted)
}

struct Scenario<'a> {
    key: &'a str,
    hazard: Option<&'a str>,
    mask: EdgeMask,
    closed: HashSet<NodeIndex>,
}

fn route_scenario(
    network: &RoadNetwork,
    weighing: &WeighingAnalysis,
    origins: &[OriginNode],
    targets: &TargetSet,
    scenario: &Scenario<'_>,
) -> ClosestRun {
    let open: HashSet<NodeIndex> = targets.nodes.iter().copied().collect();
    let found: Vec<Option<Route>> = origins
        .par_iter()
        .map(|origin| {
            shortest_path_to_any(network, &scenario.mask, origin.index, &open, |_, edge| {
                weighing.edge_weight(edge)
            })
        })
        .collect();

    let mut edge_people: BTreeMap<EdgeIndex, f64> = BTreeMap::new();
    let mut destination_people: BTreeMap<NodeId, f64> = BTreeMap::new();
    let mut reach = Vec::with_capacity(origins.len());
    for (origin, route) in origins.iter().zip(found) {
        let Some((route, target)) = route.and_then(|r| r.target().map(|t| (r, t))) else {
            reach.push(Reach::NoPath);
            continue;
        };
        let closest = ClosestRoute {
            destination: network.node_id(target),
            weight: route.cost,
            path: route.nodes.iter().map(|n| network.node_id(*n)).collect(),
        };
        if scenario.closed.contains(&target) {
            reach.push(Reach::DisruptedDestination(closest));
            continue;
        }
        for edge in &route.edges {
            *edge_people.entry(*edge).or_default() += origin.people;
        }
        *destination_people.entry(closest.destination).or_default() += origin.people;
        reach.push(Reach::Route(closest));
    }

    let run = ClosestRun {
        key: scenario.key.to_string(),
        hazard: scenario.hazard.map(str::to_string),
        category: targets.category.clone(),
        reach,
        edge_people,
        destination_people,
        disrupted_destinations: scenario
            .closed
            .iter()
            .filter(|n| targets.nodes.contains(n))
            .map(|n| network.node_id(*n))
            .collect(),
    };
    debug!(
        run = %run.column(),
        targets = open.len(),
        no_access = run.origins_without_access(),
        disrupted_destination = run.origins_with_disrupted_destination(),
        "closest destinations routed"
    );
    run
}

struct ClosestSetup {
    origins: Vec<OriginNode>,
    destinations: Vec<NodeIndex>,
    targets: Vec<TargetSet>,
}

fn setup(
    network: &RoadNetwork,
    section: &OriginsDestinationsSection,
    table: Option<&OdTable>,
) -> ClosestSetup {
    let origins: Vec<OriginNode> = network
        .nodes_in_group(&section.origins_names)
        .map(|index| {
            let node = network.node(index);
            OriginNode {
                index,
                node: node.id,
                label: group_label(node, &section.origins_names),
                people: origin_people(node, section, table),
            }
        })
        .collect();
    let destinations: Vec<NodeIndex> = network
        .nodes_in_group(&section.destinations_names)
        .collect();
    let targets = target_sets(network, &destinations, section);
    ClosestSetup {
        origins,
        destinations,
        targets,
    }
}

fn assemble(
    network: &RoadNetwork,
    section: &OriginsDestinationsSection,
    weighing: &WeighingAnalysis,
    setup: ClosestSetup,
    runs: Vec<ClosestRun>,
) -> ClosestDestinationResult {
    ClosestDestinationResult {
        weighing: weighing.column(),
        destinations: setup
            .destinations
            .iter()
            .map(|index| {
                let node = network.node(*index);
                (node.id, group_label(node, &section.destinations_names))
            })
            .collect(),
        origins: setup.origins,
        runs,
    }
}

/// Closest destination of every origin on the undisrupted network.
pub fn origin_closest_destination(
    network: &RoadNetwork,
    section: &OriginsDestinationsSection,
    table: Option<&OdTable>,
    weighing: &WeighingAnalysis,
) -> ClosestDestinationResult {
    let setup = setup(network, section, table);
    let scenario = Scenario {
        key: NO_HAZARD,
        hazard: None,
        mask: EdgeMask::none(network),
        closed: HashSet::new(),
    };
    let runs: Vec<ClosestRun> = setup
        .targets
        .iter()
        .map(|targets| route_scenario(network, weighing, &setup.origins, targets, &scenario))
        .collect();
    info!(
        origins = setup.origins.len(),
        destinations = setup.destinations.len(),
        categories = setup.targets.len(),
        "closest destinations found"
    );
    assemble(network, section, weighing, setup, runs)
}

/// Closest destinations on the undisrupted network and under every hazard.
///
/// A hazard removes the edges it disrupts. With `threshold_destinations` set,
/// a destination whose node value for the hazard exceeds it is disrupted:
/// origins closest to it are flagged `disrupted destination` instead of
/// being sent to the next destination. A destination without that value is
/// a configuration error.
pub fn multi_link_origin_closest_destination(
    network: &RoadNetwork,
    section: &OriginsDestinationsSection,
    table: Option<&OdTable>,
    weighing: &WeighingAnalysis,
    hazards: &[String],
    threshold: f64,
    threshold_destinations: Option<f64>,
) -> Ra2ceResult<ClosestDestinationResult> {
    let setup = setup(network, section, table);
    let mut scenarios = vec![Scenario {
        key: NO_HAZARD,
        hazard: None,
        mask: EdgeMask::none(network),
        closed: HashSet::new(),
    }];
    for hazard in hazards {
        let closed = match threshold_destinations {
            Some(limit) => disrupted_destinations(network, &setup.destinations, hazard, limit)?,
            None => HashSet::new(),
        };
        let mask = disrupted_edges(network, hazard, threshold);
        info!(
            hazard = %hazard,
            removed_edges = mask.removed_count(),
            closed_destinations = closed.len(),
            "hazard applied to closest destination routing"
        );
        scenarios.push(Scenario {
            key: hazard,
            hazard: Some(hazard),
            mask,
            closed,
        });
    }

    let runs: Vec<ClosestRun> = scenarios
        .iter()
        .flat_map(|scenario| setup.targets.iter().map(move |targets| (scenario, targets)))
        .map(|(scenario, targets)| {
            route_scenario(network, weighing, &setup.origins, targets, scenario)
        })
        .collect();
    for run in runs.iter().filter(|run| run.hazard.is_some()) {
        info!(
            run = %run.column(),
            no_access = run.origins_without_access(),
            disrupted_destination = run.origins_with_disrupted_destination(),
            "hazard run finished"
        );
    }
    Ok(assemble(network, section, weighing, setup, runs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{edge_with_length, label_node, network_with_edges};
    use ra2ce_core::inputs::OdRecord;

    /// ```text
    /// 5 --50-- 2 --100-- 3 (B_0)
    ///          |
    ///         100 (link 1, flooded in EV1_ma)
    ///          |
    ///  (A_0)   1 --300-- 4 (B_1)
    /// ```
    /// Origins `A_0` at 1, `A_1` at 5.
    fn network() -> RoadNetwork {
        let mut network = network_with_edges(&[
            (1, 2, edge_with_length(1, 100.0).with_hazard("EV1_ma", 1.0)),
            (2, 3, edge_with_length(2, 100.0).with_hazard("EV1_ma", 0.0)),
            (1, 4, edge_with_length(3, 300.0).with_hazard("EV1_ma", 0.0)),
            (5, 2, edge_with_length(4, 50.0).with_hazard("EV1_ma", 0.0)),
        ]);
        label_node(&mut network, 1, "A_0");
        label_node(&mut network, 5, "A_1");
        label_node(&mut network, 3, "B_0");
        label_node(&mut network, 4, "B_1");
        network
    }

    fn table() -> OdTable {
        OdTable::new(vec![
            OdRecord::origin("A_0", 100.0),
            OdRecord::origin("A_1", 50.0),
            OdRecord::destination("B_0"),
            OdRecord::destination("B_1"),
        ])
        .unwrap()
    }

    fn set_attribute(network: &mut RoadNetwork, node: i64, name: &str, value: AttrValue) {
        let index = network.node_index(NodeId::new(node)).unwrap();
        network.graph[index].attributes.insert(name.to_string(), value);
    }

    /// People on the edge of `link`; edge indices follow insertion order.
    fn people_on(run: &ClosestRun, link: usize) -> f64 {
        run.edge_people
            .get(&EdgeIndex::new(link - 1))
            .copied()
            .unwrap_or(0.0)
    }

    #[test]
    fn test_people_routed_to_closest() {
        let network = network();
        let table = table();
        let result = origin_closest_destination(
            &network,
            &OriginsDestinationsSection::default(),
            Some(&table),
            &WeighingAnalysis::Length,
        );
        let run = result.run(NO_HAZARD, None).unwrap();
        let routes: Vec<_> = run.reach.iter().map(|r| r.route().unwrap().clone()).collect();
        assert_eq!(routes[0].destination, NodeId::new(3));
        assert_eq!(routes[0].weight, 200.0);
        assert_eq!(routes[1].destination, NodeId::new(3));
        assert_eq!(routes[1].weight, 150.0);

        assert_eq!(people_on(run, 1), 100.0);
        assert_eq!(people_on(run, 2), 150.0);
        assert_eq!(people_on(run, 3), 0.0);
        assert_eq!(people_on(run, 4), 50.0);
        assert_eq!(run.destination_people[&NodeId::new(3)], 150.0);
    }

    #[test]
    fn test_hazard_reroutes_and_reports_difference() {
        let network = network();
        let table = table();
        let result = multi_link_origin_closest_destination(
            &network,
            &OriginsDestinationsSection::default(),
            Some(&table),
            &WeighingAnalysis::Length,
            &["EV1_ma".to_string()],
            0.5,
            None,
        )
        .unwrap();
        let run = result.run("EV1_ma", None).unwrap();
        let first = run.reach[0].route().unwrap();
        assert_eq!(first.destination, NodeId::new(4));
        assert_eq!(first.weight, 300.0);

        let df = result.origins_dataframe().unwrap();
        let diff = df.column("EV1_ma_difference").unwrap().f64().unwrap();
        assert_eq!(diff.get(0), Some(100.0));
        assert_eq!(diff.get(1), Some(0.0));
        assert_eq!(result.summary().len(), 2);
    }

    #[test]
    fn test_disrupted_destination_cuts_access() {
        let mut network = network();
        set_attribute(&mut network, 3, "EV1_ma", AttrValue::Number(2.0));
        set_attribute(&mut network, 4, "EV1_ma", AttrValue::Number(0.0));
        let table = table();
        let result = multi_link_origin_closest_destination(
            &network,
            &OriginsDestinationsSection::default(),
            Some(&table),
            &WeighingAnalysis::Length,
            &["EV1_ma".to_string()],
            0.5,
            Some(1.0),
        )
        .unwrap();
        let run = result.run("EV1_ma", None).unwrap();
        assert!(matches!(run.reach[1], Reach::DisruptedDestination(_)));
        assert!(run.disrupted_destinations.contains(&NodeId::new(3)));
        assert_eq!(people_on(run, 4), 0.0);

        let summary = result.summary();
        let hazard = summary.iter().find(|s| s.key == "EV1_ma").unwrap();
        assert_eq!(hazard.origins_without_access, 1);
        assert_eq!(hazard.origins_disrupted_destination, 1);
        assert_eq!(hazard.people_without_access, 50.0);
        assert_eq!(hazard.destinations_disrupted, 1);
    }

    #[test]
    fn test_missing_destination_value_is_config_error() {
        let network = network();
        let result = multi_link_origin_closest_destination(
            &network,
            &OriginsDestinationsSection::default(),
            None,
            &WeighingAnalysis::Length,
            &["EV1_ma".to_string()],
            0.5,
            Some(1.0),
        );
        assert!(matches!(result, Err(Ra2ceError::Config(_))));
    }

    #[test]
    fn test_closest_per_category() {
        let mut network = network();
        set_attribute(&mut network, 3, "kind", AttrValue::Text("hospital".into()));
        set_attribute(&mut network, 4, "kind", AttrValue::Text("school".into()));
        let section = OriginsDestinationsSection {
            category: Some("kind".to_string()),
            origin_out_fraction: 0.5,
            ..OriginsDestinationsSection::default()
        };
        let result =
            origin_closest_destination(&network, &section, None, &WeighingAnalysis::Length);
        assert_eq!(result.runs.len(), 2);

        let school = result.run(NO_HAZARD, Some("school")).unwrap();
        assert_eq!(school.column(), "noHaz_school");
        let first = school.reach[0].route().unwrap();
        assert_eq!(first.destination, NodeId::new(4));
        assert_eq!(result.origins[0].people, 0.5);

        let df = result.edges_dataframe(&network).unwrap();
        assert!(df.column("noHaz_hospital_P").is_ok());
        assert_eq!(result.destinations_dataframe().unwrap().height(), 2);
    }

    /// `A_0` at 1 is 10 m from `B_0` at 2, which floods, and 500 m from `B_1`
    /// at 3. `A_1` at 4 sits on a separate island.
    fn flooded_destination_network() -> RoadNetwork {
        let mut network = network_with_edges(&[
            (1, 2, edge_with_length(1, 10.0).with_hazard("EV1_ma", 0.0)),
            (1, 3, edge_with_length(2, 500.0).with_hazard("EV1_ma", 0.0)),
            (4, 5, edge_with_length(3, 20.0).with_hazard("EV1_ma", 0.0)),
        ]);
        label_node(&mut network, 1, "A_0");
        label_node(&mut network, 4, "A_1");
        label_node(&mut network, 2, "B_0");
        label_node(&mut network, 3, "B_1");
        set_attribute(&mut network, 2, "EV1_ma", AttrValue::Number(5.0));
        set_attribute(&mut network, 3, "EV1_ma", AttrValue::Number(0.0));
        network
    }

    #[test]
    fn test_flooded_closest_destination_is_flagged_not_rerouted() {
        let network = flooded_destination_network();
        let result = multi_link_origin_closest_destination(
            &network,
            &OriginsDestinationsSection::default(),
            None,
            &WeighingAnalysis::Length,
            &["EV1_ma".to_string()],
            0.5,
            Some(1.0),
        )
        .unwrap();

        let base = result.run(NO_HAZARD, None).unwrap();
        assert_eq!(base.reach[0].route().unwrap().destination, NodeId::new(2));
        assert_eq!(base.reach[1], Reach::NoPath);

        let run = result.run("EV1_ma", None).unwrap();
        match &run.reach[0] {
            Reach::DisruptedDestination(route) => {
                assert_eq!(route.destination, NodeId::new(2));
                assert_eq!(route.weight, 10.0);
            }
            other => panic!("unexpected reach {other:?}"),
        }
        assert_eq!(run.reach[1], Reach::NoPath);
        assert!(run.edge_people.is_empty());
        assert!(run.destination_people.is_empty());

        let df = result.origins_dataframe().unwrap();
        let flags: Vec<_> = df
            .column("EV1_ma_A")
            .unwrap()
            .utf8()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(flags, vec!["disrupted destination", "no access"]);
        let weights = df.column("EV1_ma_length").unwrap().f64().unwrap();
        assert_eq!(weights.get(0), None);

        let summary = result.summary();
        let hazard = summary.iter().find(|s| s.key == "EV1_ma").unwrap();
        assert_eq!(hazard.origins_without_access, 2);
        assert_eq!(hazard.origins_disrupted_destination, 1);
    }
}
