//! Static adjacency of the pool network and the decomposition order.

use crate::decomposition::PoolDecomposer;
use crate::pools::PoolId;
use petgraph::algo::condensation;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Graph;
use serde::{Deserialize, Serialize};
use somflux_core::errors::{SomError, SomResult};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Mechanism moving carbon along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Respiring transfer from biological decomposition
    Decomposition,
    /// Physical mixing without respiration
    Mixing,
    Photodecomposition,
    Leaching,
}

/// Directed graph of carbon transfers.
///
/// Node `i` holds `PoolId::ALL[i]`.
pub type PoolGraph = Graph<PoolId, EdgeKind>;

pub(crate) fn node(pool: PoolId) -> NodeIndex {
    NodeIndex::new(pool.index())
}

/// Build the transfer graph from the decomposers of a network.
pub fn build_graph<'a>(decomposers: impl IntoIterator<Item = &'a PoolDecomposer>) -> PoolGraph {
    let mut graph = PoolGraph::new();
    for pool in PoolId::ALL {
        graph.add_node(pool);
    }

    for decomposer in decomposers {
        let source = node(decomposer.pool());
        let params = decomposer.parameters();
        for target in params.split.targets() {
            graph.add_edge(source, node(target), EdgeKind::Decomposition);
        }
        if let Some(mixing) = &params.mixing {
            graph.add_edge(source, node(mixing.target), EdgeKind::Mixing);
        }
        if let Some(photo) = &params.photodecomposition {
            graph.add_edge(source, node(photo.target), EdgeKind::Photodecomposition);
        }
        if params.leaching.is_some() {
            graph.add_edge(source, node(PoolId::Leachate), EdgeKind::Leaching);
        }
    }
    graph
}

/// Upstream-to-downstream order of the pools in `graph`.
///
/// The network contains cycles (active and slow material feed each other), so
/// pools are ordered by a topological sort of the strongly connected
/// components. Pools within a component, and components that are ready at the
/// same time, are taken in [`PoolId`] declaration order, which puts wood and
/// litter ahead of soil organic matter.
pub fn decomposition_order(graph: &PoolGraph) -> SomResult<Vec<PoolId>> {
    let mut condensed = condensation(graph.clone(), true);
    for members in condensed.node_weights_mut() {
        members.sort();
    }

    let mut in_degree = vec![0usize; condensed.node_count()];
    for edge in condensed.edge_references() {
        in_degree[edge.target().index()] += 1;
    }

    let mut ready: BinaryHeap<Reverse<(PoolId, NodeIndex)>> = condensed
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .filter_map(|n| condensed[n].first().map(|first| Reverse((*first, n))))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(Reverse((_, component))) = ready.pop() {
        order.extend(condensed[component].iter().copied());
        for edge in condensed.edges(component) {
            let target = edge.target();
            in_degree[target.index()] -= 1;
            if in_degree[target.index()] == 0 {
                if let Some(first) = condensed[target].first() {
                    ready.push(Reverse((*first, target)));
                }
            }
        }
    }

    if order.len() != graph.node_count() {
        return Err(SomError::Configuration(
            "pool graph could not be ordered".to_string(),
        ));
    }
    Ok(order)
}
