//! Traffic attribution: how much OD traffic each link of the optimal routes carries.
//!
//! Three scores are kept per link:
//!
//! - **utilitarian** (`traffic`): origin trips spread evenly over all destinations
//! - **egalitarian** (`traffic_egalitarian`): number of origins using the link
//! - **prioritarian** (`traffic_prioritarian`): utilitarian trips scaled by the
//!   equity weight of the origin's region
//!
//! [`traffic_analysis`] picks the equity variant when equity weights are given.

pub mod accumulated;
pub mod analysis;
pub mod equity;

pub use accumulated::AccumulatedTraffic;
pub use analysis::{LinkTraffic, OdRoute, TrafficAnalysis, UtilitarianTraffic};
pub use equity::EquityTraffic;

use ra2ce_core::inputs::{EquityWeights, OdTable};

/// Equity weighted analysis when `weights` holds any region, plain otherwise.
pub fn traffic_analysis<'a>(
    od_table: &'a OdTable,
    destinations_names: &'a str,
    weights: Option<&'a EquityWeights>,
) -> Box<dyn TrafficAnalysis + 'a> {
    match weights {
        Some(weights) if !weights.is_empty() => {
            Box::new(EquityTraffic::new(od_table, destinations_names, weights))
        }
        _ => Box::new(UtilitarianTraffic::new(od_table, destinations_names)),
    }
}
