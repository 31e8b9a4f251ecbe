use super::{apply_risk, price_events, Detour, LossesEngine, LossesInputs, LossesResult};
use crate::redundancy::single_link_redundancy;
use crate::weighing::WeighingAnalysis;
use anyhow::{Context, Result};
use ra2ce_core::config::AnalysisSection;
use ra2ce_core::{EdgeIndex, RoadNetwork};
use std::collections::HashMap;
use tracing::{info, warn};

/// Losses when each hazard-affected link fails on its own.
///
/// Every link whose hazard value exceeds the threshold is priced with the
/// detour found by single link redundancy.
pub fn single_link_losses(
    network: &RoadNetwork,
    section: &AnalysisSection,
    inputs: &LossesInputs,
    weighing: &WeighingAnalysis,
) -> Result<LossesResult> {
    let engine = LossesEngine::new(section, inputs)
        .with_context(|| format!("analysis '{}'", section.name))?;
    let hazards = network.hazard_columns(section.aggregate_wl);
    if hazards.is_empty() {
        warn!(
            analysis = %section.name,
            aggregate = section.aggregate_wl.suffix(),
            "network has no hazard columns"
        );
    }

    let redundancy = single_link_redundancy(network, weighing);
    let detours: HashMap<EdgeIndex, Detour> = redundancy
        .rows
        .iter()
        .map(|row| (row.edge, Detour::from_row(row)))
        .collect();

    let mut result = price_events(network, &engine, &hazards, |hazard, view| {
        view.data
            .exceeds(hazard, section.threshold)
            .then(|| detours.get(&view.index).copied().unwrap_or(Detour::None))
    })
    .with_context(|| format!("analysis '{}'", section.name))?;
    apply_risk(&mut result, section).with_context(|| format!("analysis '{}'", section.name))?;

    info!(analysis = %section.name, summary = %result.summary(), "single link losses finished");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{edge_with_length, network_with_edges};
    use ra2ce_core::config::{AnalysisKind, PartOfDay, TripPurpose};
    use ra2ce_core::inputs::{ResilienceCurve, TripValue};
    use ra2ce_core::LinkId;

    /// Link 1 is flooded; its detour over 2-3 costs two extra meters.
    fn triangle() -> RoadNetwork {
        network_with_edges(&[
            (1, 2, edge_with_length(1, 10.0).with_hazard("EV1_ma", 0.3)),
            (1, 3, edge_with_length(2, 5.0).with_hazard("EV1_ma", 0.0)),
            (3, 2, edge_with_length(3, 7.0)),
        ])
    }

    fn inputs() -> LossesInputs {
        let mut inputs = LossesInputs::default();
        inputs
            .curves
            .insert_keyed(
                "motorway_0.2-0.5",
                ResilienceCurve::new(vec![3.0, 5.0], vec![1.0, 0.4]).unwrap(),
            )
            .unwrap();
        inputs.values.insert(
            TripPurpose::Business,
            TripValue {
                value_of_time: 5.0,
                occupants: 1.0,
            },
        );
        for link in 1..=3 {
            inputs
                .intensities
                .insert(LinkId::new(link), PartOfDay::Day, TripPurpose::Business, 240.0);
        }
        inputs
    }

    #[test]
    fn test_detour_loss_of_flooded_link() {
        let network = triangle();
        let mut section = AnalysisSection::new("sll", AnalysisKind::SingleLinkLosses);
        section.trip_purposes = vec![TripPurpose::Business];
        section.threshold = 0.1;

        let result =
            single_link_losses(&network, &section, &inputs(), &WeighingAnalysis::Length).unwrap();
        assert_eq!(result.rows.len(), 3);
        assert!(result.rows[0].disrupted);
        assert!((result.rows[0].total - 500.0).abs() < 1e-9);
        assert!(!result.rows[1].disrupted);
        assert_eq!(result.rows[1].total, 0.0);
        assert!((result.event_total("EV1_ma") - 500.0).abs() < 1e-9);

        let df = result.to_dataframe().unwrap();
        assert!(df.column("vlh_business_EV1_ma").is_ok());
        assert!(df.column("vlh_EV1_ma_total").is_ok());
        assert!(df.column("risk_vlh_total").is_err());
    }
}
