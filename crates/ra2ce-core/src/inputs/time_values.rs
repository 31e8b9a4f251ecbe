use crate::config::TripPurpose;
use crate::error::{Ra2ceError, Ra2ceResult};
use std::collections::BTreeMap;

/// Value of one hour of travel and vehicle occupancy for a trip purpose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripValue {
    pub value_of_time: f64,
    pub occupants: f64,
}

/// Values of time per trip purpose, filled once per analysis.
#[derive(Debug, Clone, Default)]
pub struct TimeValues {
    values: BTreeMap<TripPurpose, TripValue>,
}

impl TimeValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, purpose: TripPurpose, value: TripValue) {
        self.values.insert(purpose, value);
    }

    pub fn get(&self, purpose: TripPurpose) -> Ra2ceResult<&TripValue> {
        self.values.get(&purpose).ok_or_else(|| {
            Ra2ceError::Config(format!(
                "values of time table has no row for trip type '{purpose}'"
            ))
        })
    }

    /// Checks every requested purpose up front so a run fails before routing.
    pub fn require_all(&self, purposes: &[TripPurpose]) -> Ra2ceResult<()> {
        for purpose in purposes {
            self.get(*purpose)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TripPurpose, &TripValue)> {
        self.values.iter().map(|(purpose, value)| (*purpose, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_purpose_is_config_error() {
        let mut values = TimeValues::new();
        values.insert(
            TripPurpose::Business,
            TripValue {
                value_of_time: 5.0,
                occupants: 1.0,
            },
        );
        assert_eq!(values.get(TripPurpose::Business).unwrap().value_of_time, 5.0);
        let err = values
            .require_all(&[TripPurpose::Business, TripPurpose::Freight])
            .unwrap_err();
        assert!(matches!(err, Ra2ceError::Config(_)));
        assert!(err.to_string().contains("freight"));
    }
}
