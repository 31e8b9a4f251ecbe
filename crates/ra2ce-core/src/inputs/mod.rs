//! Input tables consumed by the losses and OD analyses.
//!
//! These are plain in-memory lookups. Reading them from disk lives in
//! `ra2ce-io`; the types here only enforce the invariants of each table.

pub mod equity_weights;
pub mod od_table;
pub mod resilience_curves;
pub mod time_values;
pub mod traffic_intensities;

pub use equity_weights::EquityWeights;
pub use od_table::{OdRecord, OdTable};
pub use resilience_curves::{IntensityRange, RatioScale, ResilienceCurve, ResilienceCurves};
pub use time_values::{TimeValues, TripValue};
pub use traffic_intensities::TrafficIntensities;

use crate::error::{Ra2ceError, Ra2ceResult};

/// Parses a list literal such as `[3, 5.5]` (brackets optional) into floats.
pub fn parse_float_list(literal: &str) -> Ra2ceResult<Vec<f64>> {
    let inner = literal
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| Ra2ceError::Parse(format!("'{}' in '{literal}': {e}", part.trim())))
        })
        .collect()
}
