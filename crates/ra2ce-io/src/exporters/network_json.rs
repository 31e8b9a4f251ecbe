//! Writes a road network back to node-link JSON, e.g. after the travel time
//! column was filled in by the time weighing.

use anyhow::{Context, Result};
use ra2ce_core::config::NetworkSection;
use ra2ce_core::{AttrValue, RoadNetwork};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use wkt::ToWkt;

fn attr_to_value(value: &AttrValue) -> Value {
    match value {
        AttrValue::Null => Value::Null,
        AttrValue::Bool(b) => Value::Bool(*b),
        AttrValue::Number(n) => json!(n),
        AttrValue::Text(s) => Value::String(s.clone()),
        AttrValue::List(items) => Value::Array(items.iter().map(attr_to_value).collect()),
    }
}

fn optional(value: Option<f64>) -> Value {
    value
        .filter(|v| !v.is_nan())
        .map(|v| json!(v))
        .unwrap_or(Value::Null)
}

pub fn network_to_json(network: &RoadNetwork, section: &NetworkSection) -> Value {
    let nodes: Vec<Value> = network
        .graph
        .node_weights()
        .map(|node| {
            let mut fields = Map::new();
            fields.insert("id".into(), json!(node.id.value()));
            if let Some(point) = node.geometry {
                fields.insert("x".into(), json!(point.x()));
                fields.insert("y".into(), json!(point.y()));
            }
            if !node.od_ids.is_empty() {
                fields.insert("od_id".into(), Value::String(node.od_ids.joined()));
            }
            for (name, value) in &node.attributes {
                fields.insert(name.clone(), attr_to_value(value));
            }
            Value::Object(fields)
        })
        .collect();

    let links: Vec<Value> = network
        .edges()
        .map(|view| {
            let edge = view.data;
            let mut fields = Map::new();
            fields.insert("source".into(), json!(view.u.value()));
            fields.insert("target".into(), json!(view.v.value()));
            fields.insert("key".into(), json!(view.key));
            let ids: Vec<i64> = edge.link_ids.iter().map(|id| id.value()).collect();
            fields.insert(
                section.link_id_column.clone(),
                match ids.as_slice() {
                    [single] => json!(single),
                    _ => json!(ids),
                },
            );
            let types: Vec<&str> = edge.link_types.iter().map(|t| t.as_str()).collect();
            fields.insert(
                section.link_type_column.clone(),
                match types.as_slice() {
                    [single] => json!(single),
                    _ => json!(types),
                },
            );
            fields.insert("length".into(), optional(edge.length.map(|l| l.value())));
            fields.insert("avgspeed".into(), optional(edge.avgspeed.map(|s| s.value())));
            fields.insert("time".into(), optional(edge.time.map(|t| t.value())));
            if let Some(maxspeed) = &edge.maxspeed {
                fields.insert("maxspeed".into(), Value::String(maxspeed.clone()));
            }
            fields.insert("bridge".into(), Value::String(if edge.bridge { "yes" } else { "no" }.into()));
            if let Some(geometry) = &edge.geometry {
                fields.insert("geometry".into(), Value::String(geometry.wkt_string()));
            }
            for (name, value) in &edge.hazards {
                fields.insert(name.clone(), optional(*value));
            }
            for (name, value) in &edge.attributes {
                fields.insert(name.clone(), attr_to_value(value));
            }
            Value::Object(fields)
        })
        .collect();

    json!({
        "directed": network.is_directed(),
        "multigraph": true,
        "nodes": nodes,
        "links": links,
    })
}

pub fn save_network_json(network: &RoadNetwork, section: &NetworkSection, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(&network_to_json(network, section))
        .context("serializing road network")?;
    fs::write(path, content).with_context(|| format!("writing network JSON '{}'", path.display()))
}
