//! Small hand-built networks shared by unit and integration tests.

use ra2ce_core::{LinkId, Meters, NodeId, RoadEdge, RoadNetwork, RoadNode, RoadType};

/// Motorway edge with a single link id.
pub fn edge(link_id: i64) -> RoadEdge {
    RoadEdge::new(LinkId::new(link_id)).with_link_type(RoadType::Motorway)
}

/// Motorway edge with a length in meters.
pub fn edge_with_length(link_id: i64, length: f64) -> RoadEdge {
    edge(link_id).with_length(Meters::new(length))
}

/// Undirected network from `(u, v, edge)` triples; nodes are created on first use.
pub fn network_with_edges(edges: &[(i64, i64, RoadEdge)]) -> RoadNetwork {
    let mut network = RoadNetwork::new_undirected();
    add_edges(&mut network, edges);
    network
}

fn add_edges(network: &mut RoadNetwork, edges: &[(i64, i64, RoadEdge)]) {
    for (u, v, data) in edges {
        for id in [*u, *v] {
            if network.node_index(NodeId::new(id)).is_none() {
                network
                    .add_node(RoadNode::new(NodeId::new(id)))
                    .expect("fresh node id");
            }
        }
        network
            .add_edge(NodeId::new(*u), NodeId::new(*v), data.clone())
            .expect("endpoints exist");
    }
}

/// Square 1-2-3-4 with a diagonal 1-3:
///
/// ```text
/// 1 --100-- 2
/// |  \      |
/// 100  150  100
/// |      \  |
/// 4 --100-- 3
/// ```
///
/// plus a dead-end spur 3-5 (link 6) which has no alternative.
pub fn square_with_spur() -> RoadNetwork {
    network_with_edges(&[
        (1, 2, edge_with_length(1, 100.0)),
        (2, 3, edge_with_length(2, 100.0)),
        (3, 4, edge_with_length(3, 100.0)),
        (4, 1, edge_with_length(4, 100.0)),
        (1, 3, edge_with_length(5, 150.0)),
        (3, 5, edge_with_length(6, 50.0)),
    ])
}

/// Attaches comma-joined OD labels to a node.
pub fn label_node(network: &mut RoadNetwork, node: i64, labels: &str) {
    if let Some(index) = network.node_index(NodeId::new(node)) {
        network.graph[index].od_ids = ra2ce_core::OdLabels::parse(labels);
    }
}
