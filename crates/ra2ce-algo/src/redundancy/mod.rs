//! Redundancy: the best alternative route around disrupted edges.
//!
//! Both analyses work on an [`EdgeMask`](ra2ce_core::EdgeMask) over the shared
//! network instead of removing edges from a copy, so every edge or hazard
//! event sees the unmodified base graph.
//!
//! | Analysis | Removed edges | Rows |
//! |----------|---------------|------|
//! | [`single_link_redundancy`] | one edge at a time | every edge |
//! | [`multi_link_redundancy`] | all edges disrupted by one hazard event | disrupted edges, tagged with the event |

pub mod multi_link;
pub mod single_link;

pub use multi_link::{multi_link_redundancy, MultiLinkRedundancyResult};
pub use single_link::single_link_redundancy;

use anyhow::Result;
use polars::prelude::{DataFrame, NamedFrom, Series};
use ra2ce_core::{EdgeIndex, EdgeMask, EdgeView, NodeId, RoadNetwork};

use crate::weighing::WeighingAnalysis;

/// Rounds to three decimals, keeping NaN.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// One edge and its best detour.
#[derive(Debug, Clone, PartialEq)]
pub struct RedundancyRow {
    pub edge: EdgeIndex,
    pub u: NodeId,
    pub v: NodeId,
    pub key: usize,
    pub link_id: String,
    /// Weight of the edge itself.
    pub current: f64,
    /// Weight of the detour; NaN when disconnected.
    pub alternative: f64,
    pub alt_nodes: Option<Vec<NodeId>>,
    /// `alternative - current`, rounded to three decimals; NaN when disconnected.
    pub diff: f64,
    pub connected: bool,
    /// Hazard event that removed the edge (multi-link only).
    pub hazard: Option<String>,
}

impl RedundancyRow {
    /// Routes around `view` on the network with `mask` applied.
    /// The mask is expected to already exclude the edge itself.
    pub(crate) fn detour(
        network: &RoadNetwork,
        mask: &EdgeMask,
        view: &EdgeView<'_>,
        weighing: &WeighingAnalysis,
        hazard: Option<&str>,
    ) -> Self {
        let current = weighing.current_value(view.data);
        let route = match (network.node_index(view.u), network.node_index(view.v)) {
            (Some(source), Some(target)) => {
                ra2ce_core::routing::shortest_path(network, mask, source, target, |_, edge| {
                    weighing.edge_weight(edge)
                })
            }
            _ => None,
        };

        match route {
            Some(route) => {
                let alternative = weighing.alternative_value(&route);
                Self {
                    edge: view.index,
                    u: view.u,
                    v: view.v,
                    key: view.key,
                    link_id: view.data.link_id_label(),
                    current,
                    alternative,
                    alt_nodes: Some(route.nodes.iter().map(|n| network.node_id(*n)).collect()),
                    diff: round3(alternative - current),
                    connected: true,
                    hazard: hazard.map(str::to_string),
                }
            }
            None => Self::disconnected(view, weighing, hazard),
        }
    }

    /// Row for an edge with no detour.
    pub(crate) fn disconnected(
        view: &EdgeView<'_>,
        weighing: &WeighingAnalysis,
        hazard: Option<&str>,
    ) -> Self {
        Self {
            edge: view.index,
            u: view.u,
            v: view.v,
            key: view.key,
            link_id: view.data.link_id_label(),
            current: weighing.current_value(view.data),
            alternative: f64::NAN,
            alt_nodes: None,
            diff: f64::NAN,
            connected: false,
            hazard: hazard.map(str::to_string),
        }
    }

    pub fn alt_nodes_label(&self) -> Option<String> {
        self.alt_nodes.as_ref().map(|nodes| {
            format!(
                "[{}]",
                nodes
                    .iter()
                    .map(NodeId::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }
}

/// Rows of a redundancy analysis, in edge order.
#[derive(Debug, Clone)]
pub struct RedundancyResult {
    pub weighing: &'static str,
    pub rows: Vec<RedundancyRow>,
}

impl RedundancyResult {
    pub fn disconnected_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.connected).count()
    }

    pub fn row_for(&self, edge: EdgeIndex) -> Option<&RedundancyRow> {
        self.rows.iter().find(|row| row.edge == edge)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} edges, {} without alternative route",
            self.rows.len(),
            self.disconnected_count()
        )
    }

    /// `u, v, key, link_id, <w>, alt_<w>, alt_nodes, diff_<w>, connected`,
    /// plus `hazard` when any row carries one.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let w = self.weighing;
        let rows = &self.rows;
        let mut columns = vec![
            Series::new("u", rows.iter().map(|r| r.u.value()).collect::<Vec<_>>()),
            Series::new("v", rows.iter().map(|r| r.v.value()).collect::<Vec<_>>()),
            Series::new("key", rows.iter().map(|r| r.key as u64).collect::<Vec<_>>()),
            Series::new(
                "link_id",
                rows.iter().map(|r| r.link_id.clone()).collect::<Vec<_>>(),
            ),
            Series::new(w, rows.iter().map(|r| r.current).collect::<Vec<_>>()),
            Series::new(
                &format!("alt_{w}"),
                rows.iter().map(|r| r.alternative).collect::<Vec<_>>(),
            ),
            Series::new(
                "alt_nodes",
                rows.iter().map(RedundancyRow::alt_nodes_label).collect::<Vec<_>>(),
            ),
            Series::new(
                &format!("diff_{w}"),
                rows.iter().map(|r| r.diff).collect::<Vec<_>>(),
            ),
            Series::new(
                "connected",
                rows.iter().map(|r| r.connected as i32).collect::<Vec<_>>(),
            ),
        ];
        if rows.iter().any(|r| r.hazard.is_some()) {
            columns.push(Series::new(
                "hazard",
                rows.iter().map(|r| r.hazard.clone()).collect::<Vec<_>>(),
            ));
        }
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::square_with_spur;

    #[test]
    fn test_round3_keeps_nan() {
        assert_eq!(round3(1.23456), 1.235);
        assert!(round3(f64::NAN).is_nan());
    }

    #[test]
    fn test_dataframe_columns() {
        let network = square_with_spur();
        let result = single_link_redundancy(&network, &WeighingAnalysis::Length);
        let df = result.to_dataframe().unwrap();
        let names: Vec<&str> = df.get_column_names();
        assert_eq!(
            names,
            vec![
                "u",
                "v",
                "key",
                "link_id",
                "length",
                "alt_length",
                "alt_nodes",
                "diff_length",
                "connected"
            ]
        );
        assert_eq!(df.height(), network.edge_count());
    }
}
