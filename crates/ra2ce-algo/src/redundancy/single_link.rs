use super::{RedundancyResult, RedundancyRow};
use crate::weighing::WeighingAnalysis;
use ra2ce_core::{EdgeMask, EdgeView, RoadNetwork};
use rayon::prelude::*;
use tracing::info;

/// Removes each edge on its own and routes between its endpoints.
///
/// Edges are independent: each gets a mask with only itself removed, so the
/// base network is never touched and the rows come back in edge order.
pub fn single_link_redundancy(
    network: &RoadNetwork,
    weighing: &WeighingAnalysis,
) -> RedundancyResult {
    let views: Vec<EdgeView<'_>> = network.edges().collect();
    let rows: Vec<RedundancyRow> = views
        .par_iter()
        .map(|view| {
            let mask = EdgeMask::with_removed(network, [view.index]);
            RedundancyRow::detour(network, &mask, view, weighing, None)
        })
        .collect();

    let result = RedundancyResult {
        weighing: weighing.column(),
        rows,
    };
    info!(
        edges = result.rows.len(),
        disconnected = result.disconnected_count(),
        "single link redundancy finished"
    );
    result
}
