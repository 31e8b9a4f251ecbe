use super::LossesInputs;
use crate::redundancy::RedundancyRow;
use ra2ce_core::config::{AnalysisSection, PartOfDay, TripPurpose};
use ra2ce_core::{Diagnostics, Ra2ceError, Ra2ceResult, RoadEdge, RoadType};

/// How traffic on a disrupted link copes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detour {
    /// No alternative route, or one that costs nothing extra.
    None,
    /// Extra weight of the alternative route.
    Extra(f64),
}

impl Detour {
    pub fn from_row(row: &RedundancyRow) -> Self {
        if !row.connected || row.diff.is_nan() || row.diff == 0.0 {
            Detour::None
        } else {
            Detour::Extra(row.diff)
        }
    }
}

/// Loss of one link for one hazard event.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkLoss {
    pub road_type: RoadType,
    /// Aligned with the engine's trip purposes.
    pub per_purpose: Vec<f64>,
    pub total: f64,
}

/// Vehicle loss hours of disrupted links.
///
/// For every trip purpose and every step of the matched resilience curve:
///
/// ```text
/// no detour:  I · d² · r · occupants · production_loss / divisor
/// detour:     I · d · r · max(diff, 0) · value_of_time / divisor
/// ```
///
/// `I` is the hourly intensity, `d` the step duration, `r` the functionality
/// loss ratio and `divisor` 100 for curves in percentages, 1 otherwise.
#[derive(Debug)]
pub struct LossesEngine<'a> {
    inputs: &'a LossesInputs,
    purposes: Vec<TripPurpose>,
    part_of_day: PartOfDay,
    hours_per_day: f64,
    production_loss_per_capita_per_hour: f64,
}

impl<'a> LossesEngine<'a> {
    /// Fails when a requested trip purpose has no value of time.
    pub fn new(section: &AnalysisSection, inputs: &'a LossesInputs) -> Ra2ceResult<Self> {
        inputs.values.require_all(&section.trip_purposes)?;
        if section.hours_per_day <= 0.0 {
            return Err(Ra2ceError::Config(format!(
                "analysis '{}': hours_per_day should be positive, got {}",
                section.name, section.hours_per_day
            )));
        }
        Ok(Self {
            inputs,
            purposes: section.trip_purposes.clone(),
            part_of_day: section.part_of_day,
            hours_per_day: section.hours_per_day,
            production_loss_per_capita_per_hour: section.production_loss_per_capita_per_hour,
        })
    }

    pub fn purposes(&self) -> &[TripPurpose] {
        &self.purposes
    }

    /// A zero loss for links the event leaves alone.
    pub fn no_loss(&self) -> Vec<f64> {
        vec![0.0; self.purposes.len()]
    }

    /// Loss of `edge` at hazard `intensity`. Missing traffic intensities count
    /// as zero traffic and are reported in `diag`.
    pub fn link_loss(
        &self,
        edge: &RoadEdge,
        intensity: f64,
        detour: Detour,
        diag: &mut Diagnostics,
    ) -> Ra2ceResult<LinkLoss> {
        let (road_type, curve) = self
            .inputs
            .curves
            .worst_case(&edge.link_types, intensity)
            .map_err(|err| match err {
                Ra2ceError::DataCompleteness(msg) => {
                    Ra2ceError::DataCompleteness(format!("link {}: {msg}", edge.link_id_label()))
                }
                other => other,
            })?;
        let divisor = curve.ratio_scale().divisor();

        let mut per_purpose = Vec::with_capacity(self.purposes.len());
        for purpose in &self.purposes {
            let hourly = match self.inputs.intensities.hourly_for_links(
                &edge.link_ids,
                self.part_of_day,
                *purpose,
                self.hours_per_day,
            ) {
                Some(value) => value,
                None => {
                    diag.add_warning_with_entity(
                        "losses",
                        &format!(
                            "no {}_{} traffic intensity, using 0",
                            self.part_of_day.as_str(),
                            purpose
                        ),
                        &edge.link_id_label(),
                    );
                    0.0
                }
            };
            let value = self.inputs.values.get(*purpose)?;

            let loss: f64 = curve
                .steps()
                .map(|(duration, ratio)| match detour {
                    Detour::None => {
                        hourly
                            * duration
                            * duration
                            * ratio
                            * value.occupants
                            * self.production_loss_per_capita_per_hour
                    }
                    Detour::Extra(diff) => {
                        hourly * duration * ratio * diff.max(0.0) * value.value_of_time
                    }
                })
                .sum::<f64>()
                / divisor;
            per_purpose.push(loss);
        }

        let total = per_purpose.iter().sum();
        Ok(LinkLoss {
            road_type,
            per_purpose,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::edge;
    use ra2ce_core::config::AnalysisKind;
    use ra2ce_core::inputs::{
        ResilienceCurve, ResilienceCurves, TimeValues, TrafficIntensities, TripValue,
    };
    use ra2ce_core::LinkId;

    fn inputs() -> LossesInputs {
        let mut curves = ResilienceCurves::new();
        curves
            .insert_keyed(
                "motorway_0.2-0.5",
                ResilienceCurve::new(vec![3.0, 5.0], vec![1.0, 0.4]).unwrap(),
            )
            .unwrap();
        curves
            .insert_keyed(
                "motorway_0.5-1.2",
                ResilienceCurve::new(vec![2.0, 4.0], vec![100.0, 30.0]).unwrap(),
            )
            .unwrap();
        let mut values = TimeValues::new();
        values.insert(
            TripPurpose::Business,
            TripValue {
                value_of_time: 5.0,
                occupants: 2.0,
            },
        );
        let mut intensities = TrafficIntensities::new();
        intensities.insert(LinkId::new(1), PartOfDay::Day, TripPurpose::Business, 240.0);
        LossesInputs {
            intensities,
            curves,
            values,
        }
    }

    fn section() -> AnalysisSection {
        let mut section = AnalysisSection::new("losses", AnalysisKind::SingleLinkLosses);
        section.trip_purposes = vec![TripPurpose::Business];
        section.production_loss_per_capita_per_hour = 3.0;
        section
    }

    #[test]
    fn test_detour_branch() {
        let inputs = inputs();
        let engine = LossesEngine::new(&section(), &inputs).unwrap();
        let mut diag = Diagnostics::new();
        let loss = engine
            .link_loss(&edge(1), 0.3, Detour::Extra(2.0), &mut diag)
            .unwrap();
        assert!((loss.total - 500.0).abs() < 1e-9);
        assert_eq!(loss.road_type, RoadType::Motorway);
        assert!(!diag.has_issues());
    }

    #[test]
    fn test_no_detour_branch() {
        let inputs = inputs();
        let engine = LossesEngine::new(&section(), &inputs).unwrap();
        let mut diag = Diagnostics::new();
        let loss = engine
            .link_loss(&edge(1), 0.3, Detour::None, &mut diag)
            .unwrap();
        // 10 * (9 * 1.0 + 25 * 0.4) * 2 * 3
        assert!((loss.total - 1140.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_curve_is_scaled_down() {
        let inputs = inputs();
        let engine = LossesEngine::new(&section(), &inputs).unwrap();
        let mut diag = Diagnostics::new();
        let loss = engine
            .link_loss(&edge(1), 0.7, Detour::Extra(1.0), &mut diag)
            .unwrap();
        // 10 * (2 * 100 + 4 * 30) * 1 * 5 / 100
        assert!((loss.total - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_shorter_detour_is_no_gain() {
        let inputs = inputs();
        let engine = LossesEngine::new(&section(), &inputs).unwrap();
        let mut diag = Diagnostics::new();
        let loss = engine
            .link_loss(&edge(1), 0.3, Detour::Extra(-4.0), &mut diag)
            .unwrap();
        assert_eq!(loss.total, 0.0);
    }

    #[test]
    fn test_missing_intensity_is_reported() {
        let inputs = inputs();
        let engine = LossesEngine::new(&section(), &inputs).unwrap();
        let mut diag = Diagnostics::new();
        let loss = engine
            .link_loss(&edge(9), 0.3, Detour::Extra(2.0), &mut diag)
            .unwrap();
        assert_eq!(loss.total, 0.0);
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_intensity_outside_curves_fails() {
        let inputs = inputs();
        let engine = LossesEngine::new(&section(), &inputs).unwrap();
        let mut diag = Diagnostics::new();
        let err = engine
            .link_loss(&edge(1), 1.5, Detour::None, &mut diag)
            .unwrap_err();
        match err {
            Ra2ceError::DataCompleteness(msg) => assert!(msg.starts_with("link 1:")),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_missing_value_of_time_fails_at_construction() {
        let inputs = inputs();
        let mut section = section();
        section.trip_purposes = vec![TripPurpose::Business, TripPurpose::Freight];
        assert!(LossesEngine::new(&section, &inputs).is_err());
    }
}
