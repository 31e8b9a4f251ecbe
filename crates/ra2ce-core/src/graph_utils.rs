use crate::routing::EdgeMask;
use crate::RoadNetwork;
use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;

/// Island summary: one entry per weakly connected component.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandSummary {
    pub island_id: usize,
    pub node_count: usize,
}

/// Component labels for every node of the network.
#[derive(Debug, Clone)]
pub struct IslandAnalysis {
    pub islands: Vec<IslandSummary>,
    labels: Vec<usize>,
}

impl IslandAnalysis {
    pub fn island_of(&self, node: NodeIndex) -> Option<usize> {
        self.labels.get(node.index()).copied()
    }

    /// Nodes in different islands can never be joined by a path.
    pub fn same_island(&self, a: NodeIndex, b: NodeIndex) -> bool {
        matches!((self.island_of(a), self.island_of(b)), (Some(x), Some(y)) if x == y)
    }

    pub fn count(&self) -> usize {
        self.islands.len()
    }
}

/// Weakly connected components of the network with `mask` applied.
///
/// Island ids follow the order in which islands first appear among the node
/// indices.
pub fn find_islands(network: &RoadNetwork, mask: &EdgeMask) -> IslandAnalysis {
    let mut sets = UnionFind::<usize>::new(network.node_count());
    for edge in network.graph.edge_references() {
        if !mask.is_removed(edge.id()) {
            sets.union(edge.source().index(), edge.target().index());
        }
    }

    let mut ids: BTreeMap<usize, usize> = BTreeMap::new();
    let mut islands: Vec<IslandSummary> = Vec::new();
    let labels = sets
        .into_labeling()
        .into_iter()
        .map(|root| {
            let next = ids.len();
            let island_id = *ids.entry(root).or_insert(next);
            if island_id == islands.len() {
                islands.push(IslandSummary {
                    island_id,
                    node_count: 0,
                });
            }
            islands[island_id].node_count += 1;
            island_id
        })
        .collect();

    IslandAnalysis { islands, labels }
}
