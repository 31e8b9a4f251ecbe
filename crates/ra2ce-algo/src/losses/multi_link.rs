use super::{apply_risk, price_events, Detour, LossesEngine, LossesInputs, LossesResult};
use crate::redundancy::multi_link_redundancy;
use crate::weighing::WeighingAnalysis;
use anyhow::{Context, Result};
use ra2ce_core::config::AnalysisSection;
use ra2ce_core::{EdgeIndex, RoadNetwork};
use std::collections::HashMap;
use tracing::info;

/// Losses when all links a hazard event disrupts fail together.
///
/// Bridges are never removed and so never carry a loss.
pub fn multi_link_losses(
    network: &RoadNetwork,
    section: &AnalysisSection,
    inputs: &LossesInputs,
    weighing: &WeighingAnalysis,
) -> Result<LossesResult> {
    let engine = LossesEngine::new(section, inputs)
        .with_context(|| format!("analysis '{}'", section.name))?;
    let hazards = network.hazard_columns(section.aggregate_wl);
    let redundancy = multi_link_redundancy(network, weighing, &hazards, section.threshold);
    let detours: HashMap<(&str, EdgeIndex), Detour> = redundancy
        .result
        .rows
        .iter()
        .filter_map(|row| {
            row.hazard
                .as_deref()
                .map(|hazard| ((hazard, row.edge), Detour::from_row(row)))
        })
        .collect();

    let mut result = price_events(network, &engine, &hazards, |hazard, view| {
        detours.get(&(hazard, view.index)).copied()
    })
    .with_context(|| format!("analysis '{}'", section.name))?;
    apply_risk(&mut result, section).with_context(|| format!("analysis '{}'", section.name))?;

    info!(analysis = %section.name, summary = %result.summary(), "multi link losses finished");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{edge_with_length, network_with_edges};
    use ra2ce_core::config::{
        AnalysisKind, EventType, PartOfDay, RiskCalculationMode, TripPurpose,
    };
    use ra2ce_core::inputs::{ResilienceCurve, TripValue};
    use ra2ce_core::LinkId;

    fn inputs() -> LossesInputs {
        let mut inputs = LossesInputs::default();
        inputs
            .curves
            .insert_keyed(
                "motorway_0-1",
                ResilienceCurve::new(vec![10.0], vec![1.0]).unwrap(),
            )
            .unwrap();
        inputs.values.insert(
            TripPurpose::Commute,
            TripValue {
                value_of_time: 2.0,
                occupants: 1.5,
            },
        );
        for link in 1..=3 {
            inputs
                .intensities
                .insert(LinkId::new(link), PartOfDay::Day, TripPurpose::Commute, 24.0);
        }
        inputs
    }

    fn section() -> AnalysisSection {
        let mut section = AnalysisSection::new("mll", AnalysisKind::MultiLinkLosses);
        section.trip_purposes = vec![TripPurpose::Commute];
        section.threshold = 0.5;
        section.production_loss_per_capita_per_hour = 4.0;
        section
    }

    #[test]
    fn test_dead_end_uses_production_loss() {
        let flooded = |link, rp10, rp100| {
            edge_with_length(link, 100.0)
                .with_hazard("RP10_ma", rp10)
                .with_hazard("RP100_ma", rp100)
        };
        let network = network_with_edges(&[
            (1, 2, flooded(1, 0.9, 1.0)),
            (2, 3, flooded(2, 0.0, 0.8)),
            (
                3,
                4,
                edge_with_length(3, 100.0)
                    .as_bridge()
                    .with_hazard("RP100_ma", 1.0),
            ),
        ]);
        let mut section = section();
        section.event_type = EventType::ReturnPeriod;
        section.risk_calculation_mode = RiskCalculationMode::Default;

        let result =
            multi_link_losses(&network, &section, &inputs(), &WeighingAnalysis::Length).unwrap();
        assert_eq!(result.hazards, vec!["RP100_ma".to_string(), "RP10_ma".to_string()]);

        // 1 veh/h * 10² h * 1.0 * 1.5 occupants * 4
        let rp100: Vec<f64> = result.rows_for("RP100_ma").map(|r| r.total).collect();
        assert_eq!(rp100, vec![600.0, 600.0, 0.0]);
        let rp10: Vec<f64> = result.rows_for("RP10_ma").map(|r| r.total).collect();
        assert_eq!(rp10, vec![600.0, 0.0, 0.0]);

        let risk = result.risk.clone().unwrap();
        assert!((risk[0] - 60.0).abs() < 1e-9);
        assert!((risk[1] - (0.01 * 600.0 + 0.09 * 300.0)).abs() < 1e-9);
        assert_eq!(risk[2], 0.0);

        let df = result.to_dataframe().unwrap();
        assert_eq!(df.height(), 3);
        assert!(df.column("risk_vlh_total").is_ok());
    }

    #[test]
    fn test_losses_are_never_negative() {
        let network = network_with_edges(&[
            (1, 2, edge_with_length(1, 100.0).with_hazard("EV1_ma", 0.9)),
            (1, 2, edge_with_length(2, 40.0)),
            (2, 3, edge_with_length(3, 10.0).with_hazard("EV1_ma", 0.7)),
        ]);
        let result =
            multi_link_losses(&network, &section(), &inputs(), &WeighingAnalysis::Length).unwrap();
        assert!(result.rows.iter().all(|row| row.total >= 0.0));
        assert!(result.event_total("EV1_ma") >= 0.0);
        assert_eq!(result.disrupted_count("EV1_ma"), 2);
    }
}
