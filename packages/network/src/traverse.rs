//! Bounded shortest-path expansion over annotated travel times.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::{NetworkError, RoadNetwork};

/// The subgraph reachable from a center node within a time budget:
/// every node whose minimal cumulative traversal cost fits the budget,
/// plus the induced edge set (both endpoints reachable).
#[derive(Debug, Clone)]
pub struct EgoSubgraph {
    /// The expansion center.
    pub center: NodeIndex,
    /// The budget the expansion was bounded by, in minutes.
    pub budget_minutes: f64,
    /// Reachable nodes in index order.
    pub nodes: Vec<NodeIndex>,
    /// Edges with both endpoints reachable.
    pub edges: Vec<EdgeIndex>,
}

/// Heap entry ordered so the smallest cumulative cost pops first; ties
/// break on node index for determinism.
#[derive(Debug, Clone, Copy)]
struct Visit {
    minutes: f64,
    node: NodeIndex,
}

impl PartialEq for Visit {
    fn eq(&self, other: &Self) -> bool {
        self.minutes.total_cmp(&other.minutes) == Ordering::Equal && self.node == other.node
    }
}

impl Eq for Visit {}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .minutes
            .total_cmp(&self.minutes)
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) fn ego_subgraph(
    network: &RoadNetwork,
    center: NodeIndex,
    budget_minutes: f64,
) -> Result<EgoSubgraph, NetworkError> {
    let graph = network.graph();
    if graph.node_weight(center).is_none() {
        return Err(NetworkError::NoNodeFound);
    }

    let mut settled: HashMap<NodeIndex, f64> = HashMap::new();
    let mut frontier = BinaryHeap::new();
    frontier.push(Visit {
        minutes: 0.0,
        node: center,
    });

    while let Some(Visit { minutes, node }) = frontier.pop() {
        if settled.contains_key(&node) {
            continue;
        }
        settled.insert(node, minutes);

        for edge in graph.edges(node) {
            let Some(cost) = edge.weight().minutes else {
                return Err(NetworkError::MissingTravelTime);
            };
            let neighbor = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            let next = minutes + cost;
            if next <= budget_minutes && !settled.contains_key(&neighbor) {
                frontier.push(Visit {
                    minutes: next,
                    node: neighbor,
                });
            }
        }
    }

    let reachable: HashSet<NodeIndex> = settled.keys().copied().collect();
    let mut nodes: Vec<NodeIndex> = settled.into_keys().collect();
    nodes.sort_unstable();

    let edges: Vec<EdgeIndex> = graph
        .edge_indices()
        .filter(|&edge| {
            graph
                .edge_endpoints(edge)
                .is_some_and(|(u, v)| reachable.contains(&u) && reachable.contains(&v))
        })
        .collect();

    log::debug!(
        "ego subgraph from {center:?} within {budget_minutes} min: {} nodes, {} edges",
        nodes.len(),
        edges.len()
    );

    Ok(EgoSubgraph {
        center,
        budget_minutes,
        nodes,
        edges,
    })
}
