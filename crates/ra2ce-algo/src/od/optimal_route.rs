use crate::traffic::OdRoute;
use crate::weighing::WeighingAnalysis;
use anyhow::Result;
use geo::{LineString, MultiLineString};
use polars::prelude::{DataFrame, NamedFrom, Series};
use ra2ce_core::config::OriginsDestinationsSection;
use ra2ce_core::inputs::OdTable;
use ra2ce_core::routing::shortest_path;
use ra2ce_core::{EdgeMask, LinkId, NodeId, NodeIndex, OdId, RoadNetwork, Route};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{info, warn};
use wkt::ToWkt;

/// Origin and destination nodes of the network.
///
/// Nodes are selected by their label group. With an OD table only labels
/// present in the table count.
#[derive(Debug, Clone, PartialEq)]
pub struct OdNodes {
    pub origins: Vec<NodeIndex>,
    pub destinations: Vec<NodeIndex>,
}

impl OdNodes {
    pub fn from_network(
        network: &RoadNetwork,
        section: &OriginsDestinationsSection,
        table: Option<&OdTable>,
    ) -> Self {
        let (known_origins, known_destinations) = match table {
            Some(table) => (
                Some(
                    table
                        .records()
                        .iter()
                        .filter_map(|r| r.o_id.clone())
                        .collect::<HashSet<_>>(),
                ),
                Some(
                    table
                        .records()
                        .iter()
                        .filter_map(|r| r.d_id.clone())
                        .collect::<HashSet<_>>(),
                ),
            ),
            None => (None, None),
        };
        let select = |group: &str, known: &Option<HashSet<OdId>>| -> Vec<NodeIndex> {
            network
                .nodes_in_group(group)
                .filter(|index| match known {
                    Some(known) => network
                        .node(*index)
                        .od_ids
                        .iter()
                        .any(|id| known.contains(id)),
                    None => true,
                })
                .collect()
        };
        Self {
            origins: select(&section.origins_names, &known_origins),
            destinations: select(&section.destinations_names, &known_destinations),
        }
    }

    /// Every origin with every other destination node.
    pub fn pairs(&self) -> Vec<(NodeIndex, NodeIndex)> {
        self.origins
            .iter()
            .flat_map(|o| {
                self.destinations
                    .iter()
                    .filter(move |d| *d != o)
                    .map(move |d| (*o, *d))
            })
            .collect()
    }
}

/// One optimal route between an origin and a destination node.
#[derive(Debug, Clone, PartialEq)]
pub struct OdRouteRecord {
    pub o_node: NodeId,
    pub d_node: NodeId,
    /// OD labels at the origin node, comma-joined.
    pub origin: String,
    pub destination: String,
    pub opt_path: Vec<NodeId>,
    pub weight: f64,
    pub match_ids: Vec<LinkId>,
    pub geometry: Option<MultiLineString<f64>>,
    pub hazard: Option<String>,
}

impl OdRouteRecord {
    fn from_route(network: &RoadNetwork, route: &Route, hazard: Option<&str>) -> Option<Self> {
        let first = *route.nodes.first()?;
        let last = route.target()?;
        let mut lines = Vec::with_capacity(route.edges.len());
        for (i, edge_index) in route.edges.iter().enumerate() {
            let edge = network.edge(*edge_index);
            if let Some(geometry) = &edge.geometry {
                lines.push(geometry.clone());
            } else if let (Some(a), Some(b)) = (
                network.node(route.nodes[i]).geometry,
                network.node(route.nodes[i + 1]).geometry,
            ) {
                lines.push(LineString::from(vec![a.0, b.0]));
            }
        }
        Some(Self {
            o_node: network.node_id(first),
            d_node: network.node_id(last),
            origin: network.node(first).od_ids.joined(),
            destination: network.node(last).od_ids.joined(),
            opt_path: route.nodes.iter().map(|n| network.node_id(*n)).collect(),
            weight: route.cost,
            match_ids: route
                .edges
                .iter()
                .flat_map(|e| network.edge(*e).link_ids.iter().copied())
                .collect(),
            geometry: (!lines.is_empty()).then(|| MultiLineString::new(lines)),
            hazard: hazard.map(str::to_string),
        })
    }

    pub fn as_od_route(&self) -> OdRoute {
        OdRoute {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            path: self.opt_path.clone(),
        }
    }
}

fn list_label<T: ToString>(items: &[T]) -> String {
    format!(
        "[{}]",
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// Routes for every pair on the network with `mask` applied. Pairs without a
/// path are left out; the result keeps pair order.
pub fn find_routes(
    network: &RoadNetwork,
    mask: &EdgeMask,
    weighing: &WeighingAnalysis,
    pairs: &[(NodeIndex, NodeIndex)],
    hazard: Option<&str>,
) -> Vec<OdRouteRecord> {
    let routes: Vec<OdRouteRecord> = pairs
        .par_iter()
        .filter_map(|(origin, destination)| {
            shortest_path(network, mask, *origin, *destination, |_, edge| {
                weighing.edge_weight(edge)
            })
            .and_then(|route| OdRouteRecord::from_route(network, &route, hazard))
        })
        .collect();
    dedup_routes(routes)
}

/// Keeps the first of routes sharing `(o_node, d_node, destination, weight)`.
fn dedup_routes(routes: Vec<OdRouteRecord>) -> Vec<OdRouteRecord> {
    let mut seen = HashSet::new();
    routes
        .into_iter()
        .filter(|r| {
            seen.insert((
                r.o_node,
                r.d_node,
                r.destination.clone(),
                r.weight.to_bits(),
            ))
        })
        .collect()
}

/// Optimal routes of one analysis.
#[derive(Debug, Clone)]
pub struct OdRoutesResult {
    pub weighing: &'static str,
    pub routes: Vec<OdRouteRecord>,
}

impl OdRoutesResult {
    pub fn od_routes(&self) -> Vec<OdRoute> {
        self.routes.iter().map(OdRouteRecord::as_od_route).collect()
    }

    /// `o_node, d_node, origin, destination, opt_path, <w>, match_ids,
    /// geometry` (WKT), plus `hazard` when set.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let routes = &self.routes;
        let mut columns = vec![
            Series::new(
                "o_node",
                routes.iter().map(|r| r.o_node.value()).collect::<Vec<_>>(),
            ),
            Series::new(
                "d_node",
                routes.iter().map(|r| r.d_node.value()).collect::<Vec<_>>(),
            ),
            Series::new(
                "origin",
                routes.iter().map(|r| r.origin.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "destination",
                routes.iter().map(|r| r.destination.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "opt_path",
                routes.iter().map(|r| list_label(&r.opt_path)).collect::<Vec<_>>(),
            ),
            Series::new(
                self.weighing,
                routes.iter().map(|r| r.weight).collect::<Vec<_>>(),
            ),
            Series::new(
                "match_ids",
                routes.iter().map(|r| list_label(&r.match_ids)).collect::<Vec<_>>(),
            ),
            Series::new(
                "geometry",
                routes
                    .iter()
                    .map(|r| r.geometry.as_ref().map(|g| g.wkt_string()))
                    .collect::<Vec<_>>(),
            ),
        ];
        if routes.iter().any(|r| r.hazard.is_some()) {
            columns.push(Series::new(
                "hazard",
                routes.iter().map(|r| r.hazard.clone()).collect::<Vec<_>>(),
            ));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Shortest route from every origin node to every destination node.
pub fn optimal_route_od(
    network: &RoadNetwork,
    section: &OriginsDestinationsSection,
    table: Option<&OdTable>,
    weighing: &WeighingAnalysis,
) -> OdRoutesResult {
    let nodes = OdNodes::from_network(network, section, table);
    if nodes.origins.is_empty() || nodes.destinations.is_empty() {
        warn!(
            origins = nodes.origins.len(),
            destinations = nodes.destinations.len(),
            "network has no origin or destination nodes"
        );
    }
    let pairs = nodes.pairs();
    let routes = find_routes(network, &EdgeMask::none(network), weighing, &pairs, None);
    info!(
        pairs = pairs.len(),
        routes = routes.len(),
        "optimal routes between origins and destinations found"
    );
    OdRoutesResult {
        weighing: weighing.column(),
        routes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{label_node, square_with_spur};
    use ra2ce_core::inputs::OdRecord;

    fn labelled_square() -> RoadNetwork {
        let mut network = square_with_spur();
        label_node(&mut network, 1, "A_0");
        label_node(&mut network, 4, "A_1");
        label_node(&mut network, 5, "B_0");
        network
    }

    #[test]
    fn test_routes_between_all_pairs() {
        let network = labelled_square();
        let result = optimal_route_od(
            &network,
            &OriginsDestinationsSection::default(),
            None,
            &WeighingAnalysis::Length,
        );
        assert_eq!(result.routes.len(), 2);
        let first = &result.routes[0];
        assert_eq!(first.origin, "A_0");
        assert_eq!(first.destination, "B_0");
        assert_eq!(first.weight, 200.0);
        assert_eq!(
            first.opt_path,
            vec![NodeId::new(1), NodeId::new(3), NodeId::new(5)]
        );
        assert_eq!(first.match_ids, vec![LinkId::new(5), LinkId::new(6)]);

        let df = result.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert!(df.column("length").is_ok());
    }

    #[test]
    fn test_od_table_limits_nodes() {
        let network = labelled_square();
        let table = OdTable::new(vec![
            OdRecord::origin("A_0", 10.0),
            OdRecord::destination("B_0"),
        ])
        .unwrap();
        let section = OriginsDestinationsSection::default();
        let nodes = OdNodes::from_network(&network, &section, Some(&table));
        assert_eq!(nodes.origins.len(), 1);
        assert_eq!(nodes.pairs().len(), 1);
    }

    #[test]
    fn test_duplicate_routes_are_dropped() {
        let network = labelled_square();
        let origin = network.node_index(NodeId::new(1)).unwrap();
        let destination = network.node_index(NodeId::new(5)).unwrap();
        let routes = find_routes(
            &network,
            &EdgeMask::none(&network),
            &WeighingAnalysis::Length,
            &[(origin, destination), (origin, destination)],
            None,
        );
        assert_eq!(routes.len(), 1);
    }
}
