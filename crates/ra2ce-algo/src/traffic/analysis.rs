use super::AccumulatedTraffic;
use anyhow::Result;
use polars::prelude::{DataFrame, NamedFrom, Series};
use ra2ce_core::inputs::OdTable;
use ra2ce_core::{NodeId, OdId, OdLabels, Ra2ceError, Ra2ceResult};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// An optimal route between two OD nodes. Labels may be comma-joined when
/// several OD table rows share a node.
#[derive(Debug, Clone, PartialEq)]
pub struct OdRoute {
    pub origin: String,
    pub destination: String,
    pub path: Vec<NodeId>,
}

/// Traffic summed per directed node pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTraffic {
    pub prioritarian: bool,
    pub links: BTreeMap<(NodeId, NodeId), AccumulatedTraffic>,
}

impl LinkTraffic {
    pub fn get(&self, u: NodeId, v: NodeId) -> Option<&AccumulatedTraffic> {
        self.links.get(&(u, v))
    }

    /// `u, v, traffic, traffic_egalitarian` and `traffic_prioritarian` for
    /// equity weighted runs.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let links: Vec<(&(NodeId, NodeId), &AccumulatedTraffic)> = self.links.iter().collect();
        let mut columns = vec![
            Series::new("u", links.iter().map(|((u, _), _)| u.value()).collect::<Vec<_>>()),
            Series::new("v", links.iter().map(|((_, v), _)| v.value()).collect::<Vec<_>>()),
            Series::new(
                "traffic",
                links.iter().map(|(_, t)| t.utilitarian).collect::<Vec<_>>(),
            ),
            Series::new(
                "traffic_egalitarian",
                links.iter().map(|(_, t)| t.egalitarian).collect::<Vec<_>>(),
            ),
        ];
        if self.prioritarian {
            columns.push(Series::new(
                "traffic_prioritarian",
                links.iter().map(|(_, t)| t.prioritarian).collect::<Vec<_>>(),
            ));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Attributes OD traffic to the links of optimal routes.
pub trait TrafficAnalysis: Send + Sync {
    fn od_table(&self) -> &OdTable;

    /// Group name of destination labels, e.g. `B`.
    fn destinations_names(&self) -> &str;

    /// Whether the prioritarian column is meaningful.
    fn has_prioritarian(&self) -> bool;

    /// Traffic one origin sends to one of `destination_count` destinations.
    fn contribution(&self, origin: &OdRecordRef<'_>, destination_count: f64) -> AccumulatedTraffic;

    fn origin_record<'a>(&'a self, id: &OdId) -> Ra2ceResult<OdRecordRef<'a>> {
        self.od_table()
            .origin(id)
            .map(|record| OdRecordRef {
                values: record.values,
                region: record.region.as_deref(),
            })
            .ok_or_else(|| {
                Ra2ceError::DataCompleteness(format!("origin '{id}' is not in the OD table"))
            })
    }

    /// Walks every route and sums the traffic over consecutive node pairs.
    ///
    /// A node serving several origins starts from the flow of the first
    /// origin and adds the others; a node serving several destinations
    /// multiplies the flow by their number.
    fn optimal_route_od_link(&self, routes: &[OdRoute]) -> Ra2ceResult<LinkTraffic> {
        let destination_count = self.od_table().destination_count();
        if destination_count == 0 {
            return Err(Ra2ceError::Config(
                "OD table has no destinations to spread origin traffic over".to_string(),
            ));
        }
        let destination_count = destination_count as f64;

        let mut links: BTreeMap<(NodeId, NodeId), AccumulatedTraffic> = BTreeMap::new();
        for route in routes {
            let origins: Vec<OdId> = OdLabels::parse(&route.origin)
                .iter()
                .filter(|id| !id.belongs_to(self.destinations_names()))
                .cloned()
                .collect();
            if origins.is_empty() {
                warn!(origin = %route.origin, "route without origin label, skipped");
                continue;
            }

            let mut flow = AccumulatedTraffic::ONE;
            for (i, id) in origins.iter().enumerate() {
                let contribution = self.contribution(&self.origin_record(id)?, destination_count);
                if i == 0 {
                    flow *= contribution;
                } else {
                    flow += contribution;
                }
            }
            flow.egalitarian = origins.len() as f64;

            let destinations = OdLabels::parse(&route.destination).len().max(1);
            flow *= destinations as f64;

            for pair in route.path.windows(2) {
                *links.entry((pair[0], pair[1])).or_default() += flow;
            }
        }
        debug!(routes = routes.len(), links = links.len(), "traffic attributed");
        Ok(LinkTraffic {
            prioritarian: self.has_prioritarian(),
            links,
        })
    }
}

/// The OD table fields a contribution depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdRecordRef<'a> {
    pub values: f64,
    pub region: Option<&'a str>,
}

/// Plain traffic: every trip counts the same.
#[derive(Debug)]
pub struct UtilitarianTraffic<'a> {
    od_table: &'a OdTable,
    destinations_names: &'a str,
}

impl<'a> UtilitarianTraffic<'a> {
    pub fn new(od_table: &'a OdTable, destinations_names: &'a str) -> Self {
        Self {
            od_table,
            destinations_names,
        }
    }
}

impl TrafficAnalysis for UtilitarianTraffic<'_> {
    fn od_table(&self) -> &OdTable {
        self.od_table
    }

    fn destinations_names(&self) -> &str {
        self.destinations_names
    }

    fn has_prioritarian(&self) -> bool {
        false
    }

    fn contribution(&self, origin: &OdRecordRef<'_>, destination_count: f64) -> AccumulatedTraffic {
        AccumulatedTraffic::new(origin.values / destination_count, 1.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ra2ce_core::inputs::OdRecord;

    fn od_table() -> OdTable {
        OdTable::new(vec![
            OdRecord::origin("A_0", 100.0),
            OdRecord::origin("A_1", 40.0),
            OdRecord::destination("B_0"),
            OdRecord::destination("B_1"),
            OdRecord::destination("B_2"),
            OdRecord::destination("B_3"),
        ])
        .unwrap()
    }

    fn path(ids: &[i64]) -> Vec<NodeId> {
        ids.iter().copied().map(NodeId::new).collect()
    }

    #[test]
    fn test_single_origin_spreads_over_destinations() {
        let table = od_table();
        let analysis = UtilitarianTraffic::new(&table, "B");
        let routes = vec![OdRoute {
            origin: "A_0".into(),
            destination: "B_0".into(),
            path: path(&[1, 2, 3]),
        }];
        let traffic = analysis.optimal_route_od_link(&routes).unwrap();
        let link = traffic.get(NodeId::new(1), NodeId::new(2)).unwrap();
        assert_eq!(link.utilitarian, 25.0);
        assert_eq!(link.egalitarian, 1.0);
        assert_eq!(traffic.links.len(), 2);
    }

    #[test]
    fn test_shared_links_are_summed_once() {
        let table = od_table();
        let analysis = UtilitarianTraffic::new(&table, "B");
        let routes = vec![
            OdRoute {
                origin: "A_0".into(),
                destination: "B_0".into(),
                path: path(&[1, 2, 3]),
            },
            OdRoute {
                origin: "A_1".into(),
                destination: "B_1".into(),
                path: path(&[4, 2, 3]),
            },
        ];
        let traffic = analysis.optimal_route_od_link(&routes).unwrap();
        let shared = traffic.get(NodeId::new(2), NodeId::new(3)).unwrap();
        assert_eq!(shared.utilitarian, 35.0);
        assert_eq!(shared.egalitarian, 2.0);
        assert_eq!(traffic.to_dataframe().unwrap().height(), 3);
    }

    #[test]
    fn test_joined_labels() {
        let table = od_table();
        let analysis = UtilitarianTraffic::new(&table, "B");
        let routes = vec![OdRoute {
            origin: "A_0,A_1,B_3".into(),
            destination: "B_0,B_1".into(),
            path: path(&[1, 2]),
        }];
        let traffic = analysis.optimal_route_od_link(&routes).unwrap();
        let link = traffic.get(NodeId::new(1), NodeId::new(2)).unwrap();
        // (25 + 10) per destination, two destinations at the node
        assert_eq!(link.utilitarian, 70.0);
        assert_eq!(link.egalitarian, 4.0);
    }

    #[test]
    fn test_unknown_origin_fails() {
        let table = od_table();
        let analysis = UtilitarianTraffic::new(&table, "B");
        let routes = vec![OdRoute {
            origin: "A_9".into(),
            destination: "B_0".into(),
            path: path(&[1, 2]),
        }];
        assert!(matches!(
            analysis.optimal_route_od_link(&routes),
            Err(Ra2ceError::DataCompleteness(_))
        ));
    }
}
