use std::collections::HashMap;

/// Region name given to OD rows without a weighted region.
pub const NOT_ASSIGNED: &str = "Not assigned";

/// Multiplicative weight per region for prioritarian traffic accounting.
#[derive(Debug, Clone, Default)]
pub struct EquityWeights {
    weights: HashMap<String, f64>,
}

impl EquityWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: impl Into<String>, weight: f64) {
        self.weights.insert(region.into(), weight);
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Weight of a region; unknown, missing and unassigned regions weigh 1.
    pub fn weight(&self, region: Option<&str>) -> f64 {
        match region {
            Some(NOT_ASSIGNED) | None => 1.0,
            Some(region) => self.weights.get(region).copied().unwrap_or(1.0),
        }
    }
}

impl FromIterator<(String, f64)> for EquityWeights {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_region_weighs_one() {
        let weights: EquityWeights = [("north".to_string(), 2.0)].into_iter().collect();
        assert_eq!(weights.weight(Some("north")), 2.0);
        assert_eq!(weights.weight(Some("south")), 1.0);
        assert_eq!(weights.weight(Some(NOT_ASSIGNED)), 1.0);
        assert_eq!(weights.weight(None), 1.0);
    }
}
