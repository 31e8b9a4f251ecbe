//! Resilience curves: how long a road stays disrupted and how much of its
//! function it loses, per road type and hazard intensity bucket.
//!
//! Source tables key every row with a composite string such as
//! `motorway_0.2-0.5`. That key is parsed once into a [`RoadType`] and an
//! [`IntensityRange`]; lookups afterwards are a binary search over the sorted
//! buckets of one road type.
//!
//! Buckets are lower-inclusive and upper-exclusive, except for the highest
//! bucket of a road type which also contains its upper bound. An empty upper
//! bound (`motorway_1.2-`) means the bucket is open towards +infinity.

use crate::error::{Ra2ceError, Ra2ceResult};
use crate::RoadType;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Hazard intensity interval `[lower, upper)`. `upper == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityRange {
    lower: f64,
    upper: Option<f64>,
}

impl IntensityRange {
    pub fn new(lower: f64, upper: Option<f64>) -> Ra2ceResult<Self> {
        if !lower.is_finite() {
            return Err(Ra2ceError::Parse(format!(
                "intensity range lower bound must be finite, got {lower}"
            )));
        }
        if let Some(upper) = upper {
            if upper.is_nan() || upper <= lower {
                return Err(Ra2ceError::Parse(format!(
                    "intensity range upper bound {upper} must exceed lower bound {lower}"
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    fn upper_or_inf(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }

    fn overlaps(&self, other: &IntensityRange) -> bool {
        self.lower < other.upper_or_inf() && other.lower < self.upper_or_inf()
    }

    /// Parses `0.2-0.5`, or `1.2-` for an open upper bound.
    pub fn parse(value: &str) -> Ra2ceResult<Self> {
        let (lower, upper) = value
            .split_once('-')
            .ok_or_else(|| Ra2ceError::Parse(format!("intensity range '{value}' lacks '-'")))?;
        let lower = lower
            .trim()
            .parse::<f64>()
            .map_err(|e| Ra2ceError::Parse(format!("intensity range '{value}': {e}")))?;
        let upper = match upper.trim() {
            "" => None,
            text => Some(
                text.parse::<f64>()
                    .map_err(|e| Ra2ceError::Parse(format!("intensity range '{value}': {e}")))?,
            ),
        };
        Self::new(lower, upper)
    }
}

impl fmt::Display for IntensityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "{}-{}", self.lower, upper),
            None => write!(f, "{}-", self.lower),
        }
    }
}

/// How functionality loss ratios in a curve are expressed.
///
/// A curve whose ratios are all at most 1 is read as fractions; any larger
/// ratio marks the whole curve as percentages, which are scaled down by 100
/// when losses are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioScale {
    Fraction,
    Percentage,
}

impl RatioScale {
    pub fn of(ratios: &[f64]) -> Self {
        if ratios.iter().all(|ratio| *ratio <= 1.0) {
            RatioScale::Fraction
        } else {
            RatioScale::Percentage
        }
    }

    pub fn divisor(&self) -> f64 {
        match self {
            RatioScale::Fraction => 1.0,
            RatioScale::Percentage => 100.0,
        }
    }
}

/// Duration steps (hours) paired with the functionality lost during each step.
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceCurve {
    duration_steps: Vec<f64>,
    functionality_loss_ratios: Vec<f64>,
}

impl ResilienceCurve {
    pub fn new(duration_steps: Vec<f64>, functionality_loss_ratios: Vec<f64>) -> Ra2ceResult<Self> {
        if duration_steps.len() != functionality_loss_ratios.len() {
            return Err(Ra2ceError::Parse(format!(
                "duration steps ({}) and functionality loss ratios ({}) differ in length",
                duration_steps.len(),
                functionality_loss_ratios.len()
            )));
        }
        Ok(Self {
            duration_steps,
            functionality_loss_ratios,
        })
    }

    pub fn duration_steps(&self) -> &[f64] {
        &self.duration_steps
    }

    pub fn functionality_loss_ratios(&self) -> &[f64] {
        &self.functionality_loss_ratios
    }

    /// `(duration, loss_ratio)` pairs.
    pub fn steps(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.duration_steps
            .iter()
            .copied()
            .zip(self.functionality_loss_ratios.iter().copied())
    }

    /// Σ duration · loss ratio, used to rank road types by severity.
    pub fn disruption(&self) -> f64 {
        self.steps().map(|(duration, ratio)| duration * ratio).sum()
    }

    pub fn ratio_scale(&self) -> RatioScale {
        RatioScale::of(&self.functionality_loss_ratios)
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    range: IntensityRange,
    curve: ResilienceCurve,
}

/// Resilience curves for every road type, sorted by intensity.
#[derive(Debug, Clone, Default)]
pub struct ResilienceCurves {
    by_type: BTreeMap<RoadType, Vec<Bucket>>,
}

/// Splits `motorway_link_0.2-0.5` into road type and range at the last `_`.
pub fn parse_curve_key(key: &str) -> Ra2ceResult<(RoadType, IntensityRange)> {
    let (road_type, range) = key
        .trim()
        .rsplit_once('_')
        .ok_or_else(|| Ra2ceError::Parse(format!("resilience curve key '{key}' lacks '_'")))?;
    let road_type = road_type.parse::<RoadType>().unwrap_or(RoadType::Invalid);
    Ok((road_type, IntensityRange::parse(range)?))
}

impl ResilienceCurves {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bucket. Ranges of one road type must not overlap.
    pub fn insert(
        &mut self,
        road_type: RoadType,
        range: IntensityRange,
        curve: ResilienceCurve,
    ) -> Ra2ceResult<()> {
        let buckets = self.by_type.entry(road_type).or_default();
        if let Some(existing) = buckets.iter().find(|b| b.range.overlaps(&range)) {
            warn!(
                %road_type,
                existing = %existing.range,
                rejected = %range,
                "overlapping resilience curve range"
            );
            return Err(Ra2ceError::Config(format!(
                "resilience curve ranges {} and {range} overlap for road type {road_type}",
                existing.range
            )));
        }
        let position = buckets.partition_point(|b| b.range.lower < range.lower);
        buckets.insert(position, Bucket { range, curve });
        Ok(())
    }

    /// Adds a row keyed with the composite `link_type_hazard_intensity` string.
    pub fn insert_keyed(&mut self, key: &str, curve: ResilienceCurve) -> Ra2ceResult<()> {
        let (road_type, range) = parse_curve_key(key)?;
        self.insert(road_type, range, curve)
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn road_types(&self) -> impl Iterator<Item = RoadType> + '_ {
        self.by_type.keys().copied()
    }

    /// Distinct intensity ranges over all road types, sorted by lower bound.
    pub fn ranges(&self) -> Vec<IntensityRange> {
        let mut ranges: Vec<IntensityRange> = Vec::new();
        for bucket in self.by_type.values().flatten() {
            if !ranges.contains(&bucket.range) {
                ranges.push(bucket.range);
            }
        }
        ranges.sort_by(|a, b| a.lower.total_cmp(&b.lower));
        ranges
    }

    /// Bucket of `road_type` containing `intensity`, if any.
    pub fn find(
        &self,
        road_type: RoadType,
        intensity: f64,
    ) -> Option<(&IntensityRange, &ResilienceCurve)> {
        if intensity.is_nan() {
            return None;
        }
        let buckets = self.by_type.get(&road_type)?;
        let position = buckets.partition_point(|b| b.range.lower <= intensity);
        let candidate = position.checked_sub(1)?;
        let bucket = &buckets[candidate];
        let is_top = candidate + 1 == buckets.len();
        let inside = match bucket.range.upper {
            None => true,
            Some(upper) => intensity < upper || (is_top && intensity == upper),
        };
        inside.then_some((&bucket.range, &bucket.curve))
    }

    /// Like [`find`](Self::find) but a miss is a data-completeness error.
    pub fn lookup(
        &self,
        road_type: RoadType,
        intensity: f64,
    ) -> Ra2ceResult<(&IntensityRange, &ResilienceCurve)> {
        self.find(road_type, intensity).ok_or_else(|| {
            Ra2ceError::DataCompleteness(format!(
                "no resilience curve for road type '{road_type}' and hazard intensity {intensity}"
            ))
        })
    }

    /// Road type of `link_types` with the largest disruption at `intensity`.
    ///
    /// Types without a matching bucket are ignored; it is an error only when
    /// none of them has one.
    pub fn worst_case(
        &self,
        link_types: &[RoadType],
        intensity: f64,
    ) -> Ra2ceResult<(RoadType, &ResilienceCurve)> {
        let mut best: Option<(RoadType, &ResilienceCurve)> = None;
        for road_type in link_types {
            if let Some((_, curve)) = self.find(*road_type, intensity) {
                let better = best.map_or(true, |(_, current)| curve.disruption() > current.disruption());
                if better {
                    best = Some((*road_type, curve));
                }
            }
        }
        best.ok_or_else(|| {
            let names: Vec<&str> = link_types.iter().map(RoadType::as_str).collect();
            Ra2ceError::DataCompleteness(format!(
                "no resilience curve for road type(s) [{}] and hazard intensity {intensity}",
                names.join(", ")
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> ResilienceCurves {
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
                ResilienceCurve::new(vec![2.0, 4.0], vec![1.0, 0.3]).unwrap(),
            )
            .unwrap();
        curves
    }

    #[test]
    fn test_bucket_boundaries() {
        let curves = fixture();
        let (range, curve) = curves.lookup(RoadType::Motorway, 0.3).unwrap();
        assert_eq!(range.lower(), 0.2);
        assert_eq!(curve.duration_steps(), &[3.0, 5.0]);

        let (range, _) = curves.lookup(RoadType::Motorway, 0.7).unwrap();
        assert_eq!(range.lower(), 0.5);

        // exactly on a shared boundary goes to the upper bucket
        let (range, curve) = curves.lookup(RoadType::Motorway, 0.5).unwrap();
        assert_eq!(range.lower(), 0.5);
        assert_eq!(curve.functionality_loss_ratios(), &[1.0, 0.3]);

        // top bucket includes its own upper bound
        assert!(curves.find(RoadType::Motorway, 1.2).is_some());
        assert!(curves.find(RoadType::Motorway, 1.3).is_none());
        assert!(curves.find(RoadType::Motorway, 0.1).is_none());
    }

    #[test]
    fn test_missing_curve_is_data_completeness_error() {
        let curves = fixture();
        let err = curves.lookup(RoadType::Primary, 0.3).unwrap_err();
        assert!(matches!(err, Ra2ceError::DataCompleteness(_)));
        assert!(err.to_string().contains("primary"));
        assert!(err.to_string().contains("0.3"));
    }

    #[test]
    fn test_key_with_link_suffix_and_open_range() {
        let (road_type, range) = parse_curve_key("motorway_link_1.2-").unwrap();
        assert_eq!(road_type, RoadType::MotorwayLink);
        assert_eq!(range.upper(), None);

        let mut curves = fixture();
        curves
            .insert(
                road_type,
                range,
                ResilienceCurve::new(vec![10.0], vec![1.0]).unwrap(),
            )
            .unwrap();
        assert!(curves.find(RoadType::MotorwayLink, 1e6).is_some());
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let mut curves = fixture();
        let err = curves
            .insert_keyed(
                "motorway_0.4-0.6",
                ResilienceCurve::new(vec![1.0], vec![1.0]).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, Ra2ceError::Config(_)));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        assert!(ResilienceCurve::new(vec![1.0, 2.0], vec![1.0]).is_err());
    }

    #[test]
    fn test_worst_case_and_ratio_scale() {
        let mut curves = fixture();
        curves
            .insert_keyed(
                "primary_0.2-0.5",
                ResilienceCurve::new(vec![10.0, 20.0], vec![80.0, 40.0]).unwrap(),
            )
            .unwrap();

        let (road_type, curve) = curves
            .worst_case(&[RoadType::Motorway, RoadType::Primary, RoadType::Road], 0.3)
            .unwrap();
        assert_eq!(road_type, RoadType::Primary);
        assert_eq!(curve.ratio_scale(), RatioScale::Percentage);
        assert_eq!(curve.ratio_scale().divisor(), 100.0);

        let (_, motorway) = curves.lookup(RoadType::Motorway, 0.3).unwrap();
        assert_eq!(motorway.ratio_scale().divisor(), 1.0);
        assert!((motorway.disruption() - 5.0).abs() < 1e-12);

        assert!(curves.worst_case(&[RoadType::Road], 0.3).is_err());
        assert_eq!(curves.ranges().len(), 2);
    }
}
