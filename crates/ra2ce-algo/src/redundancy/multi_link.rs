use super::{RedundancyResult, RedundancyRow};
use crate::weighing::WeighingAnalysis;
use anyhow::Result;
use polars::prelude::{DataFrame, NamedFrom, Series};
use ra2ce_core::graph_utils::find_islands;
use ra2ce_core::{EdgeIndex, EdgeMask, RoadNetwork};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Edges a hazard event removes: above `threshold` and not a bridge.
pub fn disrupted_edges(network: &RoadNetwork, hazard: &str, threshold: f64) -> EdgeMask {
    EdgeMask::with_removed(
        network,
        network
            .edges()
            .filter(|view| view.data.is_disrupted_by(hazard, threshold))
            .map(|view| view.index),
    )
}

/// Rows for every disrupted edge of every hazard event.
#[derive(Debug, Clone)]
pub struct MultiLinkRedundancyResult {
    pub hazards: Vec<String>,
    pub result: RedundancyResult,
}

impl MultiLinkRedundancyResult {
    pub fn rows_for<'a>(&'a self, hazard: &'a str) -> impl Iterator<Item = &'a RedundancyRow> + 'a {
        self.result
            .rows
            .iter()
            .filter(move |row| row.hazard.as_deref() == Some(hazard))
    }

    /// Removed-edge rows only.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        self.result.to_dataframe()
    }

    /// Every edge once per hazard event; edges the event left in place have
    /// null alternative values.
    pub fn to_full_dataframe(&self, network: &RoadNetwork) -> Result<DataFrame> {
        let w = self.result.weighing;
        let lookup: HashMap<(&str, EdgeIndex), &RedundancyRow> = self
            .result
            .rows
            .iter()
            .filter_map(|row| row.hazard.as_deref().map(|h| ((h, row.edge), row)))
            .collect();

        let mut u = Vec::new();
        let mut v = Vec::new();
        let mut key = Vec::new();
        let mut link_id = Vec::new();
        let mut current = Vec::new();
        let mut alternative = Vec::new();
        let mut alt_nodes = Vec::new();
        let mut diff = Vec::new();
        let mut connected = Vec::new();
        let mut hazard = Vec::new();

        for name in &self.hazards {
            for view in network.edges() {
                let row = lookup.get(&(name.as_str(), view.index));
                u.push(view.u.value());
                v.push(view.v.value());
                key.push(view.key as u64);
                link_id.push(view.data.link_id_label());
                current.push(row.map(|r| r.current));
                alternative.push(row.map(|r| r.alternative));
                alt_nodes.push(row.and_then(|r| r.alt_nodes_label()));
                diff.push(row.map(|r| r.diff));
                connected.push(row.map(|r| r.connected as i32));
                hazard.push(name.clone());
            }
        }

        Ok(DataFrame::new(vec![
            Series::new("u", u),
            Series::new("v", v),
            Series::new("key", key),
            Series::new("link_id", link_id),
            Series::new(w, current),
            Series::new(&format!("alt_{w}"), alternative),
            Series::new("alt_nodes", alt_nodes),
            Series::new(&format!("diff_{w}"), diff),
            Series::new("connected", connected),
            Series::new("hazard", hazard),
        ])?)
    }
}

/// Removes all edges a hazard event disrupts at once and routes around each
/// of them on what is left. Edges whose ends fall in different islands of the
/// masked network are marked disconnected without routing. Events are
/// independent and run in parallel; rows keep the order of `hazards`.
pub fn multi_link_redundancy(
    network: &RoadNetwork,
    weighing: &WeighingAnalysis,
    hazards: &[String],
    threshold: f64,
) -> MultiLinkRedundancyResult {
    let per_hazard: Vec<Vec<RedundancyRow>> = hazards
        .par_iter()
        .map(|hazard| {
            let mask = disrupted_edges(network, hazard, threshold);
            let islands = find_islands(network, &mask);
            let rows: Vec<RedundancyRow> = mask
                .removed_edges()
                .filter_map(|edge| network.edge_view(edge))
                .map(|view| {
                    let reachable = match (network.node_index(view.u), network.node_index(view.v)) {
                        (Some(u), Some(v)) => islands.same_island(u, v),
                        _ => false,
                    };
                    if reachable {
                        RedundancyRow::detour(network, &mask, &view, weighing, Some(hazard.as_str()))
                    } else {
                        RedundancyRow::disconnected(&view, weighing, Some(hazard.as_str()))
                    }
                })
                .collect();
            let disconnected = rows.iter().filter(|row| !row.connected).count();
            info!(
                hazard = %hazard,
                removed = mask.removed_count(),
                islands = islands.count(),
                disconnected,
                "multi link redundancy event finished"
            );
            rows
        })
        .collect();

    let rows: Vec<RedundancyRow> = per_hazard.into_iter().flatten().collect();
    debug!(rows = rows.len(), events = hazards.len(), "multi link redundancy finished");
    MultiLinkRedundancyResult {
        hazards: hazards.to_vec(),
        result: RedundancyResult {
            weighing: weighing.column(),
            rows,
        },
    }
}
