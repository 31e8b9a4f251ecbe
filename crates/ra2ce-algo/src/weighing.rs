//! Edge weights used for routing: length in meters or travel time in hours.
//!
//! Time weighing needs a speed for every edge. Edges without a usable
//! `avgspeed` fall back to [`AverageSpeeds`], the length-weighted mean of the
//! posted `maxspeed` per road type over the whole network.

use geo::{Distance, Haversine};
use ra2ce_core::config::Weighing;
use ra2ce_core::{
    EdgeIndex, Hours, KilometersPerHour, Meters, RoadEdge, RoadNetwork, RoadType, Route,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Speed assigned to road types without any posted speed.
pub const DEFAULT_SPEED: KilometersPerHour = KilometersPerHour::new(50.0);

/// Parses an OSM `maxspeed` tag into km/h.
///
/// Accepts `50`, `50 mph`, and ranges or alternatives (`50;60`, `50-60`,
/// `50|60`) which resolve to their mean. Tags such as `none` or `walk` give `None`.
pub fn parse_maxspeed(raw: &str) -> Option<KilometersPerHour> {
    let text = raw.trim().to_ascii_lowercase();
    let (text, mph) = match text.strip_suffix("mph") {
        Some(rest) => (rest.trim().to_string(), true),
        None => (text, false),
    };
    let values = text
        .split([';', '-', '|', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .ok()?;
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let speed = if mph {
        KilometersPerHour::from_mph(mean)
    } else {
        KilometersPerHour::new(mean)
    };
    (speed.value().is_finite() && speed.is_positive()).then_some(speed)
}

/// Haversine length of an edge geometry.
pub fn geodesic_length(edge: &RoadEdge) -> Option<Meters> {
    let geometry = edge.geometry.as_ref()?;
    let points: Vec<_> = geometry.points().collect();
    if points.len() < 2 {
        return None;
    }
    Some(Meters::new(
        points
            .windows(2)
            .map(|pair| Haversine.distance(pair[0], pair[1]))
            .sum(),
    ))
}

/// Average speed per road-type combination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AverageSpeeds {
    speeds: BTreeMap<Vec<RoadType>, KilometersPerHour>,
}

impl AverageSpeeds {
    /// Length-weighted mean `maxspeed` per link-type combination.
    /// Combinations without any parsable speed are resolved through
    /// [`AverageSpeeds::get`] fallbacks.
    pub fn from_network(network: &RoadNetwork) -> Self {
        let mut sums: BTreeMap<Vec<RoadType>, (f64, f64)> = BTreeMap::new();
        for view in network.edges() {
            let edge = view.data;
            let entry = sums.entry(edge.link_types.clone()).or_insert((0.0, 0.0));
            let (Some(speed), Some(length)) = (
                edge.maxspeed.as_deref().and_then(parse_maxspeed),
                edge.length.filter(|l| l.is_positive()),
            ) else {
                continue;
            };
            entry.0 += speed.value() * length.value();
            entry.1 += length.value();
        }

        let mut measured = AverageSpeeds::default();
        let mut missing = Vec::new();
        for (types, (weighted, total)) in sums {
            if total > 0.0 {
                measured
                    .speeds
                    .insert(types, KilometersPerHour::new(weighted / total));
            } else {
                missing.push(types);
            }
        }
        for types in missing {
            let speed = measured.get(&types);
            measured.speeds.insert(types, speed);
        }
        debug!(road_types = measured.speeds.len(), "average speeds computed");
        measured
    }

    pub fn insert(&mut self, types: Vec<RoadType>, speed: KilometersPerHour) {
        self.speeds.insert(types, speed);
    }

    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    /// Speed for a link-type combination.
    ///
    /// Unknown combinations try, in order: the first member type with its own
    /// entry, the main road of a `*_link` type, then [`DEFAULT_SPEED`].
    pub fn get(&self, types: &[RoadType]) -> KilometersPerHour {
        if let Some(speed) = self.speeds.get(types) {
            return *speed;
        }
        for road_type in types {
            if let Some(speed) = self.speeds.get(&vec![*road_type]) {
                return *speed;
            }
            if road_type.is_link() {
                if let Some(speed) = self.speeds.get(&vec![road_type.main_type()]) {
                    return *speed;
                }
            }
        }
        warn!(
            road_types = ?types,
            default = DEFAULT_SPEED.value(),
            "no average speed for road type, using default"
        );
        DEFAULT_SPEED
    }
}

/// Weight strategy for routing and detour values.
#[derive(Debug, Clone, PartialEq)]
pub enum WeighingAnalysis {
    Length,
    Time { speeds: AverageSpeeds },
}

impl WeighingAnalysis {
    /// Builds the weighing for a network; time weighing computes average
    /// speeds once up front.
    pub fn for_network(weighing: Weighing, network: &RoadNetwork) -> Self {
        match weighing {
            Weighing::Length => WeighingAnalysis::Length,
            Weighing::Time => WeighingAnalysis::Time {
                speeds: AverageSpeeds::from_network(network),
            },
        }
    }

    pub fn weighing(&self) -> Weighing {
        match self {
            WeighingAnalysis::Length => Weighing::Length,
            WeighingAnalysis::Time { .. } => Weighing::Time,
        }
    }

    /// Result column name, `length` or `time`.
    pub fn column(&self) -> &'static str {
        self.weighing().as_str()
    }

    /// Weight of an edge; NaN when it cannot be derived.
    pub fn edge_weight(&self, edge: &RoadEdge) -> f64 {
        match self {
            WeighingAnalysis::Length => {
                if let Some(length) = edge.length {
                    return length.value();
                }
                match (edge.time, edge.avgspeed) {
                    (Some(time), Some(speed)) => (time * speed).to_meters().value(),
                    _ => f64::NAN,
                }
            }
            WeighingAnalysis::Time { speeds } => {
                if let Some(time) = edge.time {
                    return time.value();
                }
                let Some(length) = edge.length else {
                    return f64::NAN;
                };
                let speed = edge
                    .avgspeed
                    .filter(|s| s.is_positive())
                    .unwrap_or_else(|| speeds.get(&edge.link_types));
                (length.to_kilometers() / speed).value()
            }
        }
    }

    /// Weight of the edge before disruption.
    pub fn current_value(&self, edge: &RoadEdge) -> f64 {
        self.edge_weight(edge)
    }

    /// Weight of an alternative route.
    pub fn alternative_value(&self, route: &Route) -> f64 {
        route.cost
    }

    /// Fills missing `avgspeed`, `length` and `time` on every edge and returns
    /// the resulting time column. Length weighing leaves the network as is.
    pub fn extend_graph(&self, network: &mut RoadNetwork) -> Vec<(EdgeIndex, Hours)> {
        let WeighingAnalysis::Time { speeds } = self else {
            return Vec::new();
        };
        let indices: Vec<EdgeIndex> = network.graph.edge_indices().collect();
        let mut times = Vec::with_capacity(indices.len());
        for index in indices {
            let edge = network.edge_mut(index);
            let speed = edge
                .maxspeed
                .as_deref()
                .and_then(parse_maxspeed)
                .unwrap_or_else(|| speeds.get(&edge.link_types));
            let speed = KilometersPerHour::new(speed.value().round().max(1.0));
            if edge.avgspeed.is_none() {
                edge.avgspeed = Some(speed);
            }
            if edge.length.is_none() {
                edge.length = geodesic_length(edge);
            }
            if edge.time.is_none() {
                let assigned = edge.avgspeed.filter(|s| s.is_positive()).unwrap_or(speed);
                edge.time = edge.length.map(|length| {
                    let hours = (length.to_kilometers() / assigned).value();
                    Hours::new((hours * 1000.0).round() / 1000.0)
                });
            }
            if let Some(time) = edge.time {
                times.push((index, time));
            }
        }
        times
    }
}
