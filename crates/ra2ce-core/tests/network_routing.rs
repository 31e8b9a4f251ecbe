use ra2ce_core::graph_utils::find_islands;
use ra2ce_core::inputs::{ResilienceCurve, ResilienceCurves};
use ra2ce_core::routing::{shortest_path, shortest_path_to_any};
use ra2ce_core::{
    EdgeIndex, EdgeMask, LinkId, Meters, NodeId, NodeIndex, Ra2ceError, RoadEdge, RoadNetwork,
    RoadNode, RoadType,
};
use std::collections::HashSet;

/// Square 1-2-3-4 with a diagonal 1-3 and a dead-end spur 3-5.
fn network() -> RoadNetwork {
    let mut network = RoadNetwork::new_undirected();
    for id in 1..=5 {
        network.add_node(RoadNode::new(NodeId::new(id))).unwrap();
    }
    let links = [
        (1, 2, 100.0),
        (2, 3, 100.0),
        (3, 4, 100.0),
        (4, 1, 100.0),
        (1, 3, 150.0),
        (3, 5, 50.0),
    ];
    for (link, (u, v, length)) in links.into_iter().enumerate() {
        let edge = RoadEdge::new(LinkId::new(link as i64 + 1))
            .with_length(Meters(length))
            .with_link_type(RoadType::Primary);
        network
            .add_edge(NodeId::new(u), NodeId::new(v), edge)
            .unwrap();
    }
    network
}

fn length(_: EdgeIndex, edge: &RoadEdge) -> f64 {
    edge.length.map_or(f64::NAN, |m| m.0)
}

fn index(network: &RoadNetwork, id: i64) -> NodeIndex {
    network.node_index(NodeId::new(id)).unwrap()
}

#[test]
fn masked_edges_force_a_detour_without_touching_the_network() {
    let network = network();
    let (from, to) = (index(&network, 1), index(&network, 3));

    let direct = shortest_path(&network, &EdgeMask::none(&network), from, to, length).unwrap();
    assert_eq!(direct.cost, 150.0);
    assert_eq!(direct.edges, vec![EdgeIndex::new(4)]);

    let mask = EdgeMask::with_removed(&network, [EdgeIndex::new(4)]);
    let detour = shortest_path(&network, &mask, from, to, length).unwrap();
    assert_eq!(detour.cost, 200.0);
    assert_eq!(detour.nodes.len(), 3);
    assert_eq!(network.edge_count(), 6);
    assert_eq!(mask.removed_count(), 1);
}

#[test]
fn removing_the_spur_isolates_its_end() {
    let network = network();
    let (hub, end) = (index(&network, 3), index(&network, 5));
    let mut mask = EdgeMask::none(&network);
    mask.remove(EdgeIndex::new(5));

    assert!(shortest_path(&network, &mask, hub, end, length).is_none());
    let islands = find_islands(&network, &mask);
    assert_eq!(islands.count(), 2);
    assert!(!islands.same_island(hub, end));
    assert_eq!(islands.islands[1].node_count, 1);

    let intact = find_islands(&network, &EdgeMask::none(&network));
    assert!(intact.same_island(hub, end));
}

#[test]
fn closest_of_several_targets_wins() {
    let network = network();
    let targets: HashSet<NodeIndex> = [index(&network, 4), index(&network, 5)]
        .into_iter()
        .collect();
    let route = shortest_path_to_any(
        &network,
        &EdgeMask::none(&network),
        index(&network, 2),
        &targets,
        length,
    )
    .unwrap();
    // 2-3-5 (150) beats 2-1-4 and 2-3-4 (200)
    assert_eq!(route.target(), Some(index(&network, 5)));
    assert_eq!(route.cost, 150.0);
}

#[test]
fn unusable_weights_block_edges() {
    let network = network();
    let route = shortest_path(
        &network,
        &EdgeMask::none(&network),
        index(&network, 1),
        index(&network, 3),
        |edge, data| {
            if edge == EdgeIndex::new(4) {
                f64::NAN
            } else {
                length(edge, data)
            }
        },
    )
    .unwrap();
    assert_eq!(route.cost, 200.0);
}

fn curve(ratio: f64) -> ResilienceCurve {
    ResilienceCurve::new(vec![2.0], vec![ratio]).unwrap()
}

#[test]
fn curve_buckets_are_half_open_except_the_top() {
    let mut curves = ResilienceCurves::new();
    curves.insert_keyed("motorway_0-0.5", curve(0.2)).unwrap();
    curves.insert_keyed("motorway_0.5-1", curve(0.6)).unwrap();

    let ratio_at = |intensity: f64| {
        curves
            .lookup(RoadType::Motorway, intensity)
            .map(|(_, curve)| curve.functionality_loss_ratios()[0])
    };
    assert_eq!(ratio_at(0.3).unwrap(), 0.2);
    assert_eq!(ratio_at(0.5).unwrap(), 0.6);
    assert_eq!(ratio_at(0.7).unwrap(), 0.6);
    assert_eq!(ratio_at(1.0).unwrap(), 0.6);
    assert!(matches!(ratio_at(1.2), Err(Ra2ceError::DataCompleteness(_))));
    assert!(curves.find(RoadType::Trunk, 0.3).is_none());
}

#[test]
fn overlapping_curve_ranges_are_rejected() {
    let mut curves = ResilienceCurves::new();
    curves.insert_keyed("motorway_0-0.5", curve(0.2)).unwrap();
    let err = curves.insert_keyed("motorway_0.4-1", curve(0.6)).unwrap_err();
    assert!(matches!(err, Ra2ceError::Config(_)));
    curves.insert_keyed("trunk_0.4-1", curve(0.6)).unwrap();
    assert_eq!(curves.len(), 2);
}
