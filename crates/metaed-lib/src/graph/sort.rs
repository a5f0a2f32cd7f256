//! Cycle-tolerant ordering.
//!
//! Cycles are broken in at most two passes. The first pass only drops
//! optional edges; the second may also drop required ones. Within a pass,
//! each cycle's vertices are walked in reverse and each vertex loses its
//! first removable edge to another member of the same cycle, re-checking
//! after every removal. Edges leaving the cycle are never touched.

use super::{DependencyGraph, GraphNode};

/// Result of [`sort_graph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOutcome<N> {
    /// Edge sources before targets. Empty when `is_fallback` is set.
    pub order: Vec<N>,
    /// Edges dropped to break cycles, as `(from, to, is_required)`.
    pub removed_edges: Vec<(N, N, bool)>,
    /// The graph stayed cyclic after both passes.
    pub is_fallback: bool,
}

impl<N> SortOutcome<N> {
    /// True if any required edge had to be dropped.
    pub fn removed_required(&self) -> bool {
        self.removed_edges.iter().any(|(_, _, required)| *required)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemovalPass {
    OptionalOnly,
    AnyEdge,
}

/// Topologically sorts `graph`, removing edges as needed to break cycles.
///
/// Never panics. If cycles survive both passes an error is logged and the
/// order is empty.
pub fn sort_graph<N: GraphNode>(mut graph: DependencyGraph<N>) -> SortOutcome<N> {
    let mut removed_edges = Vec::new();

    if let Some(order) = graph.topological_sort() {
        return SortOutcome {
            order,
            removed_edges,
            is_fallback: false,
        };
    }

    for pass in [RemovalPass::OptionalOnly, RemovalPass::AnyEdge] {
        if remove_cycles(&mut graph, pass, &mut removed_edges) {
            break;
        }
    }

    match graph.topological_sort() {
        Some(order) => SortOutcome {
            order,
            removed_edges,
            is_fallback: false,
        },
        None => {
            tracing::error!(
                nodes = graph.node_count(),
                cycles = graph.find_cycles().len(),
                "dependency graph is still cyclic after removing required edges; returning empty order"
            );
            SortOutcome {
                order: Vec::new(),
                removed_edges,
                is_fallback: true,
            }
        }
    }
}

/// Runs one removal pass. Returns true once the graph is acyclic.
fn remove_cycles<N: GraphNode>(
    graph: &mut DependencyGraph<N>,
    pass: RemovalPass,
    removed: &mut Vec<(N, N, bool)>,
) -> bool {
    for cycle in graph.find_cycles() {
        for vertex in cycle.iter().rev() {
            let candidate = graph
                .out_edges(vertex)
                .find(|(to, required)| {
                    cycle.contains(to) && (pass == RemovalPass::AnyEdge || !required)
                })
                .map(|(to, required)| (to.clone(), required));
            let Some((to, is_required)) = candidate else {
                continue;
            };

            graph.remove_edge(vertex, &to);
            tracing::debug!(from = ?vertex, to = ?to, is_required, ?pass, "removed edge to break cycle");
            removed.push((vertex.clone(), to, is_required));

            if graph.is_acyclic() {
                return true;
            }
        }
    }
    false
}
