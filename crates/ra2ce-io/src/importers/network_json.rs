//! Node-link JSON road networks.
//!
//! The layout follows the usual node-link serialization of a multigraph:
//!
//! ```json
//! {
//!   "nodes": [{"id": 1, "x": 4.36, "y": 52.01, "od_id": "A_0"}],
//!   "links": [{"source": 1, "target": 2, "rfid": [3, 4], "length": 420.0,
//!              "highway": "motorway", "bridge": "yes",
//!              "geometry": "LINESTRING (4.36 52.01, 4.37 52.02)", "EV1_ma": 0.3}]
//! }
//! ```
//!
//! Edge attributes named like hazard columns become hazard values; anything
//! the model does not know is kept as a dynamic attribute.

use anyhow::{anyhow, Context, Result};
use geo::{LineString, Point};
use ra2ce_core::config::NetworkSection;
use ra2ce_core::hazard::is_hazard_column;
use ra2ce_core::inputs::parse_float_list;
use ra2ce_core::{
    AttrValue, Hours, ImportDiagnostics, KilometersPerHour, LinkId, Meters, NodeId, OdLabels,
    RoadEdge, RoadNetwork, RoadNode, RoadType,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;
use wkt::TryFromWkt;

/// A network together with the issues raised while loading it.
#[derive(Debug)]
pub struct ImportResult {
    pub network: RoadNetwork,
    pub diagnostics: ImportDiagnostics,
}

#[derive(Debug, Deserialize)]
struct NodeLinkJson {
    #[serde(default)]
    nodes: Vec<Map<String, Value>>,
    #[serde(default, alias = "edges")]
    links: Vec<Map<String, Value>>,
}

const NODE_KEYS: [&str; 5] = ["id", "x", "y", "geometry", "od_id"];
const EDGE_KEYS: [&str; 10] = [
    "source", "target", "key", "length", "avgspeed", "time", "maxspeed", "bridge", "geometry",
    "link_type",
];

pub fn value_to_attr(value: &Value) -> AttrValue {
    match value {
        Value::Null => AttrValue::Null,
        Value::Bool(b) => AttrValue::Bool(*b),
        Value::Number(n) => n.as_f64().map(AttrValue::Number).unwrap_or(AttrValue::Null),
        Value::String(s) => AttrValue::Text(s.clone()),
        Value::Array(items) => AttrValue::List(items.iter().map(value_to_attr).collect()),
        Value::Object(_) => AttrValue::Text(value.to_string()),
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| !v.is_nan())
}

fn node_id(value: Option<&Value>) -> Option<NodeId> {
    number(value)
        .filter(|v| v.fract() == 0.0)
        .map(|v| NodeId::new(v as i64))
}

/// `7`, `[3, 4]` or `"[3, 4]"`.
fn link_ids(value: Option<&Value>) -> Result<Vec<LinkId>> {
    let raw: Vec<f64> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Number(n)) => n.as_f64().into_iter().collect(),
        Some(Value::Array(items)) => items.iter().filter_map(|v| number(Some(v))).collect(),
        Some(Value::String(s)) => parse_float_list(s)?,
        Some(other) => return Err(anyhow!("link id has unsupported value {other}")),
    };
    Ok(raw.into_iter().map(|id| LinkId::new(id as i64)).collect())
}

/// `"motorway"`, `["motorway", "trunk"]` or `"['motorway', 'trunk']"`.
fn road_types(value: Option<&Value>) -> Vec<RoadType> {
    let parse = |text: &str| text.trim().trim_matches(['\'', '"']).parse::<RoadType>();
    match value {
        Some(Value::String(s)) => s
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .filter_map(|part| parse(part).ok())
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|text| parse(text).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn is_bridge(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "yes" | "true" | "1"),
        _ => false,
    }
}

fn node_geometry(fields: &Map<String, Value>) -> Option<Point<f64>> {
    if let (Some(x), Some(y)) = (number(fields.get("x")), number(fields.get("y"))) {
        return Some(Point::new(x, y));
    }
    fields
        .get("geometry")
        .and_then(Value::as_str)
        .and_then(|text| Point::try_from_wkt_str(text).ok())
}

/// Reads a node-link JSON network. Column names for link ids and road types
/// come from the network section.
pub fn load_network_json(path: &Path, section: &NetworkSection) -> Result<ImportResult> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading network JSON '{}'", path.display()))?;
    let parsed: NodeLinkJson = serde_json::from_str(&content)
        .with_context(|| format!("parsing network JSON '{}'", path.display()))?;
    let mut diag = ImportDiagnostics::new();
    let network = build_network(&parsed, section, &mut diag)?;
    info!(
        nodes = network.node_count(),
        edges = network.edge_count(),
        diagnostics = %diag.summary(),
        "loaded road network from {}",
        path.display()
    );
    Ok(ImportResult {
        network,
        diagnostics: diag,
    })
}

fn build_network(
    parsed: &NodeLinkJson,
    section: &NetworkSection,
    diag: &mut ImportDiagnostics,
) -> Result<RoadNetwork> {
    let mut network = if section.directed {
        RoadNetwork::new_directed()
    } else {
        RoadNetwork::new_undirected()
    };

    for (i, fields) in parsed.nodes.iter().enumerate() {
        let Some(id) = node_id(fields.get("id")) else {
            diag.skip_row("network", "node without integer id", i + 1);
            continue;
        };
        let mut node = RoadNode::new(id);
        node.geometry = node_geometry(fields);
        if let Some(od) = fields.get("od_id").and_then(Value::as_str) {
            node.od_ids = OdLabels::parse(od);
        }
        for (name, value) in fields {
            if !NODE_KEYS.contains(&name.as_str()) {
                node.attributes.insert(name.clone(), value_to_attr(value));
            }
        }
        network
            .add_node(node)
            .with_context(|| format!("node {} of the network", i + 1))?;
    }
    diag.stats.rows += network.node_count();

    for (i, fields) in parsed.links.iter().enumerate() {
        let line = i + 1;
        let (Some(u), Some(v)) = (node_id(fields.get("source")), node_id(fields.get("target")))
        else {
            diag.skip_row("network", "link without source/target", line);
            continue;
        };
        let ids = link_ids(fields.get(section.link_id_column.as_str()))
            .with_context(|| format!("link {line}: column '{}'", section.link_id_column))?;
        if ids.is_empty() {
            diag.default_value(
                "network",
                &format!("link {u}-{v} has no '{}'", section.link_id_column),
                line,
            );
        }

        let mut edge = RoadEdge::default().with_link_ids(ids);
        edge.length = number(fields.get("length")).map(Meters::new);
        edge.avgspeed = number(fields.get("avgspeed")).map(KilometersPerHour::new);
        edge.time = number(fields.get("time")).map(Hours::new);
        edge.maxspeed = match fields.get("maxspeed") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                    .collect::<Vec<_>>()
                    .join(";"),
            ),
            _ => None,
        };
        edge.link_types = road_types(fields.get(section.link_type_column.as_str()));
        edge.bridge = is_bridge(fields.get("bridge"));
        edge.geometry = fields
            .get("geometry")
            .and_then(Value::as_str)
            .and_then(|text| LineString::try_from_wkt_str(text).ok());

        for (name, value) in fields {
            if EDGE_KEYS.contains(&name.as_str())
                || *name == section.link_id_column
                || *name == section.link_type_column
            {
                continue;
            }
            if is_hazard_column(name) {
                edge.set_hazard(name.clone(), number(Some(value)));
            } else {
                edge.attributes.insert(name.clone(), value_to_attr(value));
            }
        }

        network
            .add_edge(u, v, edge)
            .with_context(|| format!("link {line} ({u}-{v}) of the network"))?;
    }

    Ok(network)
}
