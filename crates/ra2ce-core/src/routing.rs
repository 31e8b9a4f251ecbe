//! Shortest paths over a road network with some edges masked out.
//!
//! Every analysis that "removes" links works on an [`EdgeMask`]: the network
//! arena stays untouched and each working copy only owns a bitset of removed
//! edges. Cloning a mask is the deep copy a hazard event needs.
//!
//! Edge costs come from a caller-supplied closure so the same search serves
//! the length and time weighings. Costs that are NaN, infinite or negative make
//! an edge unusable for that search.

use crate::{RoadEdge, RoadNetwork};
use fixedbitset::FixedBitSet;
use petgraph::graph::{EdgeIndex, NodeIndex};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Set of edges removed from a network for one working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMask {
    removed: FixedBitSet,
}

impl EdgeMask {
    /// Mask with nothing removed.
    pub fn none(network: &RoadNetwork) -> Self {
        Self {
            removed: FixedBitSet::with_capacity(network.edge_count()),
        }
    }

    pub fn with_removed(network: &RoadNetwork, edges: impl IntoIterator<Item = EdgeIndex>) -> Self {
        let mut mask = Self::none(network);
        for edge in edges {
            mask.remove(edge);
        }
        mask
    }

    pub fn remove(&mut self, edge: EdgeIndex) {
        self.removed.grow(edge.index() + 1);
        self.removed.insert(edge.index());
    }

    #[inline]
    pub fn is_removed(&self, edge: EdgeIndex) -> bool {
        self.removed.contains(edge.index())
    }

    pub fn removed_count(&self) -> usize {
        self.removed.count_ones(..)
    }

    pub fn removed_edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.removed.ones().map(EdgeIndex::new)
    }
}

/// A shortest path: visited nodes, traversed edges and the summed cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub cost: f64,
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
}

impl Route {
    pub fn target(&self) -> Option<NodeIndex> {
        self.nodes.last().copied()
    }
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    cost: f64,
    node: NodeIndex,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    // Reversed so the max-heap pops the cheapest entry; ties break on node index.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

#[inline]
fn usable(cost: f64) -> bool {
    cost.is_finite() && cost >= 0.0
}

/// Dijkstra from `source` to `target`. `None` when the target is unreachable.
pub fn shortest_path<F>(
    network: &RoadNetwork,
    mask: &EdgeMask,
    source: NodeIndex,
    target: NodeIndex,
    weight: F,
) -> Option<Route>
where
    F: Fn(EdgeIndex, &RoadEdge) -> f64,
{
    let targets: HashSet<NodeIndex> = [target].into_iter().collect();
    shortest_path_to_any(network, mask, source, &targets, weight)
}

/// Dijkstra from `source` stopping at the first reached node in `targets`.
///
/// Equivalent to routing to a virtual sink joined to every target with zero
/// cost edges, without adding that sink to the graph. Parallel edges resolve to
/// the cheapest one.
pub fn shortest_path_to_any<F>(
    network: &RoadNetwork,
    mask: &EdgeMask,
    source: NodeIndex,
    targets: &HashSet<NodeIndex>,
    weight: F,
) -> Option<Route>
where
    F: Fn(EdgeIndex, &RoadEdge) -> f64,
{
    let n = network.node_count();
    if source.index() >= n || targets.is_empty() {
        return None;
    }

    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<(EdgeIndex, NodeIndex)>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[source.index()] = 0.0;
    heap.push(HeapEntry {
        cost: 0.0,
        node: source,
    });

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        if cost > dist[node.index()] {
            continue;
        }
        if targets.contains(&node) {
            return Some(rebuild(source, node, cost, &prev));
        }
        for (edge, neighbor) in network.incident_edges(node) {
            if mask.is_removed(edge) {
                continue;
            }
            let edge_cost = weight(edge, network.edge(edge));
            if !usable(edge_cost) {
                continue;
            }
            let next = cost + edge_cost;
            if next < dist[neighbor.index()] {
                dist[neighbor.index()] = next;
                prev[neighbor.index()] = Some((edge, node));
                heap.push(HeapEntry {
                    cost: next,
                    node: neighbor,
                });
            }
        }
    }
    None
}

fn rebuild(
    source: NodeIndex,
    target: NodeIndex,
    cost: f64,
    prev: &[Option<(EdgeIndex, NodeIndex)>],
) -> Route {
    let mut nodes = vec![target];
    let mut edges = Vec::new();
    let mut current = target;
    while current != source {
        match prev[current.index()] {
            Some((edge, parent)) => {
                edges.push(edge);
                nodes.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    nodes.reverse();
    edges.reverse();
    Route { cost, nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinkId, Meters, NodeId, RoadNode};

    fn length(_: EdgeIndex, edge: &RoadEdge) -> f64 {
        edge.length.map(|l| l.value()).unwrap_or(f64::NAN)
    }

    /// Square 1-2-3-4 with a diagonal 1-3 and a parallel 1-2 edge.
    fn square() -> RoadNetwork {
        let mut network = RoadNetwork::new_undirected();
        for id in 1..=4 {
            network.add_node(RoadNode::new(NodeId::new(id))).unwrap();
        }
        let edges = [(1, 2, 10.0), (2, 3, 10.0), (3, 4, 10.0), (4, 1, 10.0), (1, 3, 25.0), (1, 2, 4.0)];
        for (i, (u, v, l)) in edges.into_iter().enumerate() {
            network
                .add_edge(
                    NodeId::new(u),
                    NodeId::new(v),
                    crate::RoadEdge::new(LinkId::new(i as i64)).with_length(Meters(l)),
                )
                .unwrap();
        }
        network
    }

    #[test]
    fn test_shortest_path_prefers_cheapest_parallel_edge() {
        let network = square();
        let mask = EdgeMask::none(&network);
        let route = shortest_path(&network, &mask, NodeIndex::new(0), NodeIndex::new(2), length).unwrap();
        assert!((route.cost - 14.0).abs() < 1e-9);
        assert_eq!(route.nodes, vec![NodeIndex::new(0), NodeIndex::new(1), NodeIndex::new(2)]);
        assert_eq!(route.edges[0], EdgeIndex::new(5));
    }

    #[test]
    fn test_mask_removes_edges_without_touching_network() {
        let network = square();
        let before: Vec<_> = network.graph.edge_weights().cloned().collect();
        let mask = EdgeMask::with_removed(&network, [EdgeIndex::new(0), EdgeIndex::new(5)]);
        let route = shortest_path(&network, &mask, NodeIndex::new(0), NodeIndex::new(1), length).unwrap();
        assert!((route.cost - 30.0).abs() < 1e-9);
        assert_eq!(mask.removed_count(), 2);

        let after: Vec<_> = network.graph.edge_weights().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unreachable_returns_none() {
        let network = square();
        let mask = EdgeMask::with_removed(&network, network.graph.edge_indices());
        assert!(shortest_path(&network, &mask, NodeIndex::new(0), NodeIndex::new(2), length).is_none());
    }

    #[test]
    fn test_nan_weight_edges_are_skipped() {
        let network = square();
        let mask = EdgeMask::none(&network);
        let route = shortest_path(&network, &mask, NodeIndex::new(0), NodeIndex::new(1), |e, edge| {
            if e == EdgeIndex::new(5) {
                f64::NAN
            } else {
                length(e, edge)
            }
        })
        .unwrap();
        assert!((route.cost - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_shortest_path_to_any_target() {
        let network = square();
        let mask = EdgeMask::none(&network);
        let targets: HashSet<_> = [NodeIndex::new(2), NodeIndex::new(3)].into_iter().collect();
        let route = shortest_path_to_any(&network, &mask, NodeIndex::new(0), &targets, length).unwrap();
        assert_eq!(route.target(), Some(NodeIndex::new(3)));
        assert!((route.cost - 10.0).abs() < 1e-9);
    }
}
