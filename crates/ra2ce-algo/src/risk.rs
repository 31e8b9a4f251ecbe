//! Expected annual loss from per-return-period losses.
//!
//! Losses are integrated over the exceedance frequency `1 / return_period`
//! with the trapezoidal rule:
//!
//! ```text
//! risk = ∫ loss(f) df,   f = 1 / RP
//! ```
//!
//! Beyond the largest return period the loss is held at the largest observed
//! loss (frequency 0). How the curve is closed towards frequent events
//! depends on the mode:
//!
//! | Mode | Frequent side |
//! |------|---------------|
//! | `Default` | ends at the smallest return period |
//! | `CutFromYear(y)` | truncated at `y`, losses at `y` interpolated |
//!
//! When `y` is itself one of the return periods, `CutFromYear` keeps the
//! samples from `y` upwards as they are and adds no frequency-0 tail.
//! | `TriangleToNullYear(y)` | drops linearly to zero at `y` |

use ra2ce_core::config::RiskCalculationMode;
use ra2ce_core::{Ra2ceError, Ra2ceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskIntegration {
    Default,
    CutFromYear(u32),
    TriangleToNullYear(u32),
}

impl RiskIntegration {
    /// `None` when risk is not requested.
    pub fn from_mode(mode: RiskCalculationMode, year: u32) -> Option<Self> {
        match mode {
            RiskCalculationMode::None => None,
            RiskCalculationMode::Default => Some(RiskIntegration::Default),
            RiskCalculationMode::CutFromYear => Some(RiskIntegration::CutFromYear(year)),
            RiskCalculationMode::TriangleToNullYear => {
                Some(RiskIntegration::TriangleToNullYear(year))
            }
        }
    }

    /// Checks the mode's year against the available return periods.
    pub fn validate(&self, return_periods: &[f64]) -> Ra2ceResult<()> {
        let Some(min_rp) = return_periods.iter().copied().reduce(f64::min) else {
            return Ok(());
        };
        match *self {
            RiskIntegration::Default => Ok(()),
            RiskIntegration::CutFromYear(year) if f64::from(year) <= min_rp => {
                Err(Ra2ceError::Config(format!(
                    "risk_calculation_year {year} should be larger than the smallest return period {min_rp}"
                )))
            }
            RiskIntegration::TriangleToNullYear(year)
                if year != 0 && f64::from(year) >= min_rp =>
            {
                Err(Ra2ceError::Config(format!(
                    "risk_calculation_year {year} should be smaller than the smallest return period {min_rp}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Integrates `(return_period, loss)` samples. NaN losses count as zero.
    ///
    /// A single return period under `Default` integrates to the rectangle
    /// `loss / return_period`.
    pub fn integrate(&self, samples: &[(f64, f64)]) -> Ra2ceResult<f64> {
        let mut points: Vec<(f64, f64)> = samples
            .iter()
            .filter(|(rp, _)| *rp > 0.0)
            .map(|&(rp, loss)| (rp, if loss.is_nan() { 0.0 } else { loss }))
            .collect();
        if points.is_empty() {
            return Ok(0.0);
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let return_periods: Vec<f64> = points.iter().map(|(rp, _)| *rp).collect();
        self.validate(&return_periods)?;

        let (max_rp, max_loss) = points[points.len() - 1];
        let mut tail = true;
        let mut curve = match *self {
            RiskIntegration::Default => points,
            RiskIntegration::CutFromYear(year) => {
                let year = f64::from(year);
                if year >= max_rp {
                    vec![(year, max_loss)]
                } else if return_periods.contains(&year) {
                    // an observed cut year closes the curve at the largest return period
                    tail = false;
                    points.into_iter().filter(|(rp, _)| *rp >= year).collect()
                } else {
                    let at_year = interpolate(&points, year);
                    let mut kept: Vec<(f64, f64)> =
                        points.into_iter().filter(|(rp, _)| *rp > year).collect();
                    kept.insert(0, (year, at_year));
                    kept
                }
            }
            RiskIntegration::TriangleToNullYear(year) => {
                let year = f64::from(year.max(1));
                let mut with_zero = vec![(year, 0.0)];
                with_zero.extend(points);
                with_zero
            }
        };
        if tail {
            curve.push((f64::INFINITY, max_loss));
        }

        // frequencies ascend as return periods descend
        let by_frequency: Vec<(f64, f64)> = curve
            .iter()
            .rev()
            .map(|&(rp, loss)| (1.0 / rp, loss))
            .collect();
        Ok(by_frequency
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0) * (pair[0].1 + pair[1].1) / 2.0)
            .sum())
    }
}

/// Linear interpolation of the loss at `rp` between the neighbouring samples.
fn interpolate(points: &[(f64, f64)], rp: f64) -> f64 {
    if let Some((_, loss)) = points.iter().find(|(p, _)| *p == rp) {
        return *loss;
    }
    let below = points.iter().rev().find(|(p, _)| *p < rp);
    let above = points.iter().find(|(p, _)| *p > rp);
    match (below, above) {
        (Some(&(r0, l0)), Some(&(r1, l1))) => l0 + (l1 - l0) * (rp - r0) / (r1 - r0),
        (Some(&(_, l)), None) | (None, Some(&(_, l))) => l,
        (None, None) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [(f64, f64); 2] = [(100.0, 200.0), (10.0, 100.0)];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_holds_largest_loss() {
        let risk = RiskIntegration::Default.integrate(&SAMPLES).unwrap();
        // 0.01 * 200 + 0.09 * (200 + 100) / 2
        assert!(close(risk, 15.5));
    }

    #[test]
    fn test_single_return_period_is_a_rectangle() {
        let risk = RiskIntegration::Default.integrate(&[(50.0, 400.0)]).unwrap();
        assert!(close(risk, 8.0));
    }

    #[test]
    fn test_cut_from_year_interpolates() {
        let risk = RiskIntegration::CutFromYear(50).integrate(&SAMPLES).unwrap();
        let at_50 = 100.0 + 100.0 * 40.0 / 90.0;
        assert!(close(risk, 0.01 * 200.0 + 0.01 * (200.0 + at_50) / 2.0));
    }

    #[test]
    fn test_cut_from_existing_year() {
        let risk = RiskIntegration::CutFromYear(100)
            .integrate(&[(10.0, 100.0), (100.0, 200.0), (1000.0, 300.0)])
            .unwrap();
        // samples below 100 dropped, no tail beyond 1000
        assert!(close(risk, 0.009 * 250.0));
    }

    #[test]
    fn test_cut_between_return_periods_keeps_tail() {
        let risk = RiskIntegration::CutFromYear(500)
            .integrate(&[(10.0, 100.0), (100.0, 200.0), (1000.0, 300.0)])
            .unwrap();
        let at_500 = 200.0 + 100.0 * 400.0 / 900.0;
        assert!(close(risk, 0.001 * 300.0 + 0.001 * (300.0 + at_500) / 2.0));
    }

    #[test]
    fn test_cut_beyond_largest_return_period() {
        let risk = RiskIntegration::CutFromYear(200).integrate(&SAMPLES).unwrap();
        assert!(close(risk, 1.0));
    }

    #[test]
    fn test_cut_year_below_smallest_is_rejected() {
        let err = RiskIntegration::CutFromYear(10).integrate(&SAMPLES).unwrap_err();
        assert!(matches!(err, Ra2ceError::Config(_)));
    }

    #[test]
    fn test_triangle_to_null_year() {
        let risk = RiskIntegration::TriangleToNullYear(5)
            .integrate(&SAMPLES)
            .unwrap();
        assert!(close(risk, 15.5 + 0.1 * 100.0 / 2.0));
        assert!(RiskIntegration::TriangleToNullYear(20)
            .integrate(&SAMPLES)
            .is_err());
    }

    #[test]
    fn test_nan_losses_count_as_zero() {
        let risk = RiskIntegration::Default
            .integrate(&[(10.0, f64::NAN), (100.0, 200.0)])
            .unwrap();
        assert!(close(risk, 0.01 * 200.0 + 0.09 * 100.0));
    }

    #[test]
    fn test_mode_none_has_no_integration() {
        assert_eq!(RiskIntegration::from_mode(RiskCalculationMode::None, 0), None);
        assert_eq!(
            RiskIntegration::from_mode(RiskCalculationMode::CutFromYear, 25),
            Some(RiskIntegration::CutFromYear(25))
        );
    }
}
