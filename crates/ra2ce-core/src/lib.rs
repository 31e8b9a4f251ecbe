//! # ra2ce-core: Road Network Model
//!
//! Data structures shared by the RA2CE criticality, redundancy and losses analyses.
//!
//! ## Design Philosophy
//!
//! Road networks are modeled as **multigraphs** stored in a petgraph arena:
//! - **Nodes**: junctions, carrying an optional point geometry and the set of
//!   origin/destination labels attached to them
//! - **Edges**: road segments, carrying link ids, length, speed, road types,
//!   geometry and one numeric column per hazard event
//!
//! The arena is never mutated by an analysis. Link removal is expressed with an
//! [`routing::EdgeMask`] per working copy, so disrupting a hazard event cannot
//! leak into the next one and "restore the removed edge" is a no-op.
//!
//! ## Quick Start
//!
//! ```rust
//! use ra2ce_core::*;
//!
//! let mut network = RoadNetwork::new_undirected();
//! network.add_node(RoadNode::new(NodeId::new(1))).unwrap();
//! network.add_node(RoadNode::new(NodeId::new(2)).with_od_ids("A_1")).unwrap();
//!
//! let edge = RoadEdge::new(LinkId::new(10))
//!     .with_length(Meters(250.0))
//!     .with_link_type(RoadType::Primary)
//!     .with_hazard("EV1_ma", 0.7);
//! network.add_edge(NodeId::new(1), NodeId::new(2), edge).unwrap();
//!
//! assert_eq!(network.edge_count(), 1);
//! assert_eq!(network.hazard_names(), vec!["EV1_ma".to_string()]);
//! ```
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | Serde analysis configuration and loader |
//! | [`diagnostics`] | Auditable warnings for recovered numeric edge cases |
//! | [`error`] | [`Ra2ceError`] / [`Ra2ceResult`] |
//! | [`graph_utils`] | Connected components under a mask |
//! | [`hazard`] | `EV1_ma` / `RP100_max` column names |
//! | [`inputs`] | Resilience curves, values of time, intensities, OD table, equity weights |
//! | [`routing`] | Edge masks and Dijkstra shortest paths |
//! | [`units`] | Meters, kilometers, km/h, hours |

use geo::{LineString, Point};
use petgraph::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod hazard;
pub mod inputs;
pub mod routing;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, ImportDiagnostics, ImportStats, Severity};
pub use error::{Ra2ceError, Ra2ceResult};
pub use hazard::{HazardColumn, HazardKind};
pub use petgraph::graph::{EdgeIndex, NodeIndex};
pub use routing::{EdgeMask, Route};
pub use units::{Hours, Kilometers, KilometersPerHour, Meters};

/// Node identifier as found in the source network (OSM node id or sequence number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(i64);

/// Link identifier (`rfid` / `link_id`), the key into the traffic intensities table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(i64);

impl NodeId {
    #[inline]
    pub fn new(value: i64) -> Self {
        NodeId(value)
    }
    #[inline]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl LinkId {
    #[inline]
    pub fn new(value: i64) -> Self {
        LinkId(value)
    }
    #[inline]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dynamically typed attribute value for edge/node columns the model does not name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Numeric value; NaN counts as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            AttrValue::Null => true,
            AttrValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Null => "null",
            AttrValue::Bool(_) => "bool",
            AttrValue::Number(_) => "number",
            AttrValue::Text(_) => "text",
            AttrValue::List(_) => "list",
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// OpenStreetMap road classification (`highway` tag).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    None,
    Motorway,
    MotorwayLink,
    Trunk,
    TrunkLink,
    Primary,
    PrimaryLink,
    Secondary,
    SecondaryLink,
    Tertiary,
    TertiaryLink,
    Residential,
    Road,
    Tunnel,
    Bridge,
    Culvert,
    Rail,
    Unclassified,
    #[default]
    #[serde(other)]
    Invalid,
}

impl RoadType {
    pub const ALL: [RoadType; 19] = [
        RoadType::None,
        RoadType::Motorway,
        RoadType::MotorwayLink,
        RoadType::Trunk,
        RoadType::TrunkLink,
        RoadType::Primary,
        RoadType::PrimaryLink,
        RoadType::Secondary,
        RoadType::SecondaryLink,
        RoadType::Tertiary,
        RoadType::TertiaryLink,
        RoadType::Residential,
        RoadType::Road,
        RoadType::Tunnel,
        RoadType::Bridge,
        RoadType::Culvert,
        RoadType::Rail,
        RoadType::Unclassified,
        RoadType::Invalid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoadType::None => "none",
            RoadType::Motorway => "motorway",
            RoadType::MotorwayLink => "motorway_link",
            RoadType::Trunk => "trunk",
            RoadType::TrunkLink => "trunk_link",
            RoadType::Primary => "primary",
            RoadType::PrimaryLink => "primary_link",
            RoadType::Secondary => "secondary",
            RoadType::SecondaryLink => "secondary_link",
            RoadType::Tertiary => "tertiary",
            RoadType::TertiaryLink => "tertiary_link",
            RoadType::Residential => "residential",
            RoadType::Road => "road",
            RoadType::Tunnel => "tunnel",
            RoadType::Bridge => "bridge",
            RoadType::Culvert => "culvert",
            RoadType::Rail => "rail",
            RoadType::Unclassified => "unclassified",
            RoadType::Invalid => "invalid",
        }
    }

    pub fn is_link(&self) -> bool {
        self.as_str().ends_with("_link")
    }

    /// The main road a `*_link` ramp belongs to; other types map to themselves.
    pub fn main_type(&self) -> RoadType {
        match self {
            RoadType::MotorwayLink => RoadType::Motorway,
            RoadType::TrunkLink => RoadType::Trunk,
            RoadType::PrimaryLink => RoadType::Primary,
            RoadType::SecondaryLink => RoadType::Secondary,
            RoadType::TertiaryLink => RoadType::Tertiary,
            other => *other,
        }
    }
}

impl FromStr for RoadType {
    type Err = std::convert::Infallible;

    /// Unknown OSM values map to [`RoadType::Invalid`] instead of failing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Ok(RoadType::ALL
            .iter()
            .copied()
            .find(|rt| rt.as_str() == normalized)
            .unwrap_or(RoadType::Invalid))
    }
}

impl fmt::Display for RoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin or destination label such as `A_12` (origin name `A`, OD table row 12).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OdId(String);

impl OdId {
    pub fn new(value: impl Into<String>) -> Self {
        OdId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this label belongs to the named origin or destination group.
    pub fn belongs_to(&self, group: &str) -> bool {
        self.0.starts_with(group)
    }
}

impl fmt::Display for OdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insertion-ordered set of OD labels attached to one node.
///
/// Parsed once from the comma-joined `od_id` attribute of the source graph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OdLabels(Vec<OdId>);

impl OdLabels {
    pub fn parse(joined: &str) -> Self {
        let mut labels = OdLabels::default();
        for part in joined.split(',') {
            let part = part.trim();
            if !part.is_empty() && part != "nan" {
                labels.insert(OdId::new(part));
            }
        }
        labels
    }

    pub fn insert(&mut self, id: OdId) -> bool {
        if self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OdId> {
        self.0.iter()
    }

    pub fn contains(&self, id: &OdId) -> bool {
        self.0.contains(id)
    }

    /// Any label belongs to the named group (see [`OdId::belongs_to`]).
    pub fn has_group(&self, group: &str) -> bool {
        self.0.iter().any(|id| id.belongs_to(group))
    }

    /// Comma-joined form used in result tables.
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(OdId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A junction in the road network.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadNode {
    pub id: NodeId,
    pub geometry: Option<Point<f64>>,
    pub od_ids: OdLabels,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl RoadNode {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            geometry: None,
            od_ids: OdLabels::default(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_geometry(mut self, point: Point<f64>) -> Self {
        self.geometry = Some(point);
        self
    }

    pub fn with_od_ids(mut self, joined: &str) -> Self {
        self.od_ids = OdLabels::parse(joined);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Numeric attribute; missing, non-numeric and NaN values read as `None`.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(AttrValue::as_f64)
    }
}

/// A road segment.
///
/// Hazard columns hold `None` when the overlay produced no value for the edge,
/// which is not the same as a zero intensity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoadEdge {
    /// One id normally, several when segments were merged during simplification.
    pub link_ids: Vec<LinkId>,
    pub length: Option<Meters>,
    pub avgspeed: Option<KilometersPerHour>,
    pub time: Option<Hours>,
    /// Raw OSM `maxspeed` tag, parsed on demand.
    pub maxspeed: Option<String>,
    pub link_types: Vec<RoadType>,
    pub bridge: bool,
    pub geometry: Option<LineString<f64>>,
    pub hazards: BTreeMap<String, Option<f64>>,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl RoadEdge {
    pub fn new(link_id: LinkId) -> Self {
        Self {
            link_ids: vec![link_id],
            ..Self::default()
        }
    }

    pub fn with_link_ids(mut self, ids: Vec<LinkId>) -> Self {
        self.link_ids = ids;
        self
    }

    pub fn with_length(mut self, length: Meters) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_avgspeed(mut self, speed: KilometersPerHour) -> Self {
        self.avgspeed = Some(speed);
        self
    }

    pub fn with_time(mut self, time: Hours) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_maxspeed(mut self, maxspeed: impl Into<String>) -> Self {
        self.maxspeed = Some(maxspeed.into());
        self
    }

    pub fn with_link_type(mut self, link_type: RoadType) -> Self {
        self.link_types.push(link_type);
        self
    }

    pub fn as_bridge(mut self) -> Self {
        self.bridge = true;
        self
    }

    pub fn with_geometry(mut self, geometry: LineString<f64>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_hazard(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set_hazard(name, Some(value));
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Stores a hazard value, normalizing NaN to "no value".
    pub fn set_hazard(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.hazards
            .insert(name.into(), value.filter(|v| !v.is_nan()));
    }

    /// Hazard intensity for an event column, `None` when absent or NaN.
    pub fn hazard(&self, name: &str) -> Option<f64> {
        self.hazards.get(name).copied().flatten()
    }

    /// Hazard value strictly above the threshold. Missing values never exceed.
    pub fn exceeds(&self, hazard: &str, threshold: f64) -> bool {
        self.hazard(hazard).is_some_and(|value| value > threshold)
    }

    /// Edges removed by a hazard event: above threshold and not a bridge.
    pub fn is_disrupted_by(&self, hazard: &str, threshold: f64) -> bool {
        !self.bridge && self.exceeds(hazard, threshold)
    }

    pub fn primary_link_id(&self) -> Option<LinkId> {
        self.link_ids.first().copied()
    }

    /// `12` for a single link, `[12, 13]` for merged links.
    pub fn link_id_label(&self) -> String {
        match self.link_ids.as_slice() {
            [single] => single.to_string(),
            ids => format!(
                "[{}]",
                ids.iter()
                    .map(LinkId::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    pub fn link_type_label(&self) -> String {
        match self.link_types.as_slice() {
            [single] => single.to_string(),
            types => format!(
                "[{}]",
                types
                    .iter()
                    .map(RoadType::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Borrowed view of one edge with its endpoints and parallel-edge key.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    pub index: EdgeIndex,
    pub u: NodeId,
    pub v: NodeId,
    pub key: usize,
    pub data: &'a RoadEdge,
}

/// The road network multigraph.
///
/// Storage is always a directed petgraph arena; an undirected network walks
/// every edge in both directions.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    pub graph: Graph<RoadNode, RoadEdge, Directed>,
    directed: bool,
    node_lookup: HashMap<NodeId, NodeIndex>,
    edge_keys: Vec<usize>,
}

impl RoadNetwork {
    pub fn new_undirected() -> Self {
        Self::with_direction(false)
    }

    pub fn new_directed() -> Self {
        Self::with_direction(true)
    }

    fn with_direction(directed: bool) -> Self {
        Self {
            graph: Graph::new(),
            directed,
            node_lookup: HashMap::new(),
            edge_keys: Vec::new(),
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn add_node(&mut self, node: RoadNode) -> Ra2ceResult<NodeIndex> {
        if self.node_lookup.contains_key(&node.id) {
            return Err(Ra2ceError::Network(format!("duplicate node id {}", node.id)));
        }
        let id = node.id;
        let index = self.graph.add_node(node);
        self.node_lookup.insert(id, index);
        Ok(index)
    }

    /// Adds an edge between two existing nodes. Parallel edges get increasing keys.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, edge: RoadEdge) -> Ra2ceResult<EdgeIndex> {
        let a = self.require_node(u)?;
        let b = self.require_node(v)?;
        let key = self.edges_between(a, b).len();
        let index = self.graph.add_edge(a, b, edge);
        self.edge_keys.push(key);
        Ok(index)
    }

    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_lookup.get(&id).copied()
    }

    pub fn require_node(&self, id: NodeId) -> Ra2ceResult<NodeIndex> {
        self.node_index(id)
            .ok_or_else(|| Ra2ceError::Network(format!("unknown node id {id}")))
    }

    pub fn node(&self, index: NodeIndex) -> &RoadNode {
        &self.graph[index]
    }

    pub fn node_id(&self, index: NodeIndex) -> NodeId {
        self.graph[index].id
    }

    pub fn edge(&self, index: EdgeIndex) -> &RoadEdge {
        &self.graph[index]
    }

    pub fn edge_mut(&mut self, index: EdgeIndex) -> &mut RoadEdge {
        &mut self.graph[index]
    }

    pub fn edge_view(&self, index: EdgeIndex) -> Option<EdgeView<'_>> {
        let (a, b) = self.graph.edge_endpoints(index)?;
        Some(EdgeView {
            index,
            u: self.node_id(a),
            v: self.node_id(b),
            key: self.edge_keys.get(index.index()).copied().unwrap_or(0),
            data: &self.graph[index],
        })
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.graph
            .edge_indices()
            .filter_map(move |index| self.edge_view(index))
    }

    /// Edges leaving `node`, as `(edge, neighbor)`; both directions when undirected.
    pub fn incident_edges(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, NodeIndex)> + '_ {
        let reverse = if self.directed {
            None
        } else {
            Some(
                self.graph
                    .edges_directed(node, Direction::Incoming)
                    .filter(|edge| edge.source() != edge.target())
                    .map(|edge| (edge.id(), edge.source())),
            )
        };
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target()))
            .chain(reverse.into_iter().flatten())
    }

    /// Edges joining `a` to `b` (either orientation when undirected).
    pub fn edges_between(&self, a: NodeIndex, b: NodeIndex) -> Vec<EdgeIndex> {
        self.incident_edges(a)
            .filter(|(_, neighbor)| *neighbor == b)
            .map(|(edge, _)| edge)
            .collect()
    }

    /// Sorted, unique hazard column names present on any edge.
    pub fn hazard_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self
            .graph
            .edge_weights()
            .flat_map(|edge| edge.hazards.keys())
            .collect();
        names.into_iter().cloned().collect()
    }

    /// Hazard columns read under an aggregation (`EV1_ma`, `EV2_ma` for `None`).
    pub fn hazard_columns(&self, aggregate: config::AggregateWl) -> Vec<String> {
        self.hazard_names()
            .into_iter()
            .filter(|name| {
                HazardColumn::parse(name).is_some_and(|column| column.aggregate == aggregate)
            })
            .collect()
    }

    /// Nodes carrying at least one OD label belonging to `group`.
    pub fn nodes_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = NodeIndex> + 'a {
        self.graph
            .node_indices()
            .filter(move |index| self.graph[*index].od_ids.has_group(group))
    }
}

impl Default for RoadNetwork {
    fn default() -> Self {
        Self::new_undirected()
    }
}
