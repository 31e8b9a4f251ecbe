//! Hazard column names as produced by the hazard overlay.
//!
//! Columns are `EV<n>_<agg>` for events and `RP<n>_<agg>` for return periods,
//! where `<agg>` is one of `ma`, `max`, `mean`, `min`. The `_fr` columns
//! (fraction of the edge inundated) are not hazard intensities.

use crate::config::AggregateWl;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardKind {
    Event,
    ReturnPeriod,
}

/// A parsed hazard column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HazardColumn {
    pub kind: HazardKind,
    /// Event number, or the return period in years.
    pub number: u32,
    pub aggregate: AggregateWl,
}

impl HazardColumn {
    pub fn parse(name: &str) -> Option<HazardColumn> {
        let (prefix, suffix) = name.rsplit_once('_')?;
        let aggregate = match suffix {
            "ma" => AggregateWl::None,
            "max" => AggregateWl::Max,
            "mean" => AggregateWl::Mean,
            "min" => AggregateWl::Min,
            _ => return None,
        };
        let (kind, digits) = if let Some(digits) = prefix.strip_prefix("EV") {
            (HazardKind::Event, digits)
        } else if let Some(digits) = prefix.strip_prefix("RP") {
            (HazardKind::ReturnPeriod, digits)
        } else {
            return None;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(HazardColumn {
            kind,
            number: digits.parse().ok()?,
            aggregate,
        })
    }

    pub fn return_period(&self) -> Option<u32> {
        (self.kind == HazardKind::ReturnPeriod).then_some(self.number)
    }
}

impl fmt::Display for HazardColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            HazardKind::Event => "EV",
            HazardKind::ReturnPeriod => "RP",
        };
        write!(f, "{prefix}{}_{}", self.number, self.aggregate.suffix())
    }
}

pub fn is_hazard_column(name: &str) -> bool {
    HazardColumn::parse(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hazard_columns() {
        let column = HazardColumn::parse("RP100_max").unwrap();
        assert_eq!(column.return_period(), Some(100));
        assert_eq!(column.aggregate, AggregateWl::Max);
        assert_eq!(column.to_string(), "RP100_max");

        assert_eq!(HazardColumn::parse("EV1_ma").unwrap().kind, HazardKind::Event);
        assert!(!is_hazard_column("EV1_fr"));
        assert!(!is_hazard_column("EVx_ma"));
        assert!(!is_hazard_column("length"));
    }

    #[test]
    fn test_columns_are_set_keys() {
        let names = ["EV1_ma", "EV1_ma", "EV1_max", "RP10_ma"];
        let columns: std::collections::HashSet<HazardColumn> = names
            .into_iter()
            .filter_map(HazardColumn::parse)
            .collect();
        assert_eq!(columns.len(), 3);
        assert!(columns.contains(&HazardColumn {
            kind: HazardKind::Event,
            number: 1,
            aggregate: AggregateWl::Max,
        }));
    }
}
