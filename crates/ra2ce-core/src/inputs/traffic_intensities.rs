//! Daily traffic intensities per link, split by part of day and trip purpose.

use crate::config::{PartOfDay, TripPurpose};
use crate::LinkId;
use std::collections::HashMap;

/// Vehicles per day on each link for every `(part of day, purpose)` column.
#[derive(Debug, Clone, Default)]
pub struct TrafficIntensities {
    per_link: HashMap<LinkId, HashMap<(PartOfDay, TripPurpose), f64>>,
}

/// Maps a column header such as `evening_freight` to its part of day and purpose.
/// Aggregate columns (`day_total`) and unrelated headers give `None`.
pub fn parse_intensity_column(header: &str) -> Option<(PartOfDay, TripPurpose)> {
    let (part, purpose) = header.trim().split_once('_')?;
    Some((PartOfDay::parse(part)?, TripPurpose::parse(purpose)?))
}

impl TrafficIntensities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, link: LinkId, part: PartOfDay, purpose: TripPurpose, per_day: f64) {
        self.per_link
            .entry(link)
            .or_default()
            .insert((part, purpose), per_day);
    }

    pub fn contains(&self, link: LinkId) -> bool {
        self.per_link.contains_key(&link)
    }

    pub fn len(&self) -> usize {
        self.per_link.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_link.is_empty()
    }

    pub fn daily(&self, link: LinkId, part: PartOfDay, purpose: TripPurpose) -> Option<f64> {
        self.per_link
            .get(&link)
            .and_then(|columns| columns.get(&(part, purpose)))
            .copied()
            .filter(|value| !value.is_nan())
    }

    /// Daily intensity of a possibly merged link: the maximum over its member ids.
    pub fn daily_for_links(
        &self,
        links: &[LinkId],
        part: PartOfDay,
        purpose: TripPurpose,
    ) -> Option<f64> {
        links
            .iter()
            .filter_map(|link| self.daily(*link, part, purpose))
            .reduce(f64::max)
    }

    /// Vehicles per hour, spreading the daily count over `hours_per_day`.
    pub fn hourly_for_links(
        &self,
        links: &[LinkId],
        part: PartOfDay,
        purpose: TripPurpose,
        hours_per_day: f64,
    ) -> Option<f64> {
        self.daily_for_links(links, part, purpose)
            .map(|per_day| per_day / hours_per_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_parsing() {
        assert_eq!(
            parse_intensity_column("evening_freight"),
            Some((PartOfDay::Evening, TripPurpose::Freight))
        );
        assert_eq!(parse_intensity_column("day_total"), None);
        assert_eq!(parse_intensity_column("link_id"), None);
    }

    #[test]
    fn test_merged_links_take_maximum() {
        let mut intensities = TrafficIntensities::new();
        intensities.insert(LinkId::new(1), PartOfDay::Day, TripPurpose::Business, 240.0);
        intensities.insert(LinkId::new(2), PartOfDay::Day, TripPurpose::Business, 480.0);

        let merged = [LinkId::new(1), LinkId::new(2), LinkId::new(99)];
        assert_eq!(
            intensities.daily_for_links(&merged, PartOfDay::Day, TripPurpose::Business),
            Some(480.0)
        );
        assert_eq!(
            intensities.hourly_for_links(&merged, PartOfDay::Day, TripPurpose::Business, 24.0),
            Some(20.0)
        );
        assert_eq!(
            intensities.daily_for_links(&[LinkId::new(99)], PartOfDay::Day, TripPurpose::Business),
            None
        );
    }
}
