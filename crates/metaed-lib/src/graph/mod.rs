//! Directed dependency graphs with required and optional edges.
//!
//! Iteration order is insertion order everywhere (nodes, successors,
//! predecessors), so every traversal below is deterministic for a given
//! sequence of `add_node`/`set_edge` calls.

mod sort;

#[cfg(test)]
mod graph_tests;

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

pub use sort::{SortOutcome, sort_graph};

/// Marker for types usable as graph nodes.
pub trait GraphNode: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> GraphNode for T {}

#[derive(Debug, Clone)]
pub struct DependencyGraph<N: GraphNode> {
    /// Outgoing edges per node, with the edge's `is_required` flag.
    successors: IndexMap<N, IndexMap<N, bool>>,
    /// Incoming edge sources per node, in edge insertion order.
    predecessors: IndexMap<N, IndexSet<N>>,
}

impl<N: GraphNode> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self {
            successors: IndexMap::new(),
            predecessors: IndexMap::new(),
        }
    }
}

impl<N: GraphNode> DependencyGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node if absent. Existing nodes keep their position.
    pub fn add_node(&mut self, node: N) {
        if !self.successors.contains_key(&node) {
            self.successors.insert(node.clone(), IndexMap::new());
            self.predecessors.insert(node, IndexSet::new());
        }
    }

    /// Adds `from → to`, inserting missing nodes `from` first.
    ///
    /// Setting an existing edge only updates its flag.
    pub fn set_edge(&mut self, from: N, to: N, is_required: bool) {
        self.add_node(from.clone());
        self.add_node(to.clone());
        if let Some(out) = self.successors.get_mut(&from) {
            out.insert(to.clone(), is_required);
        }
        if let Some(incoming) = self.predecessors.get_mut(&to) {
            incoming.insert(from);
        }
    }

    /// Removes `from → to`, returning its `is_required` flag if it existed.
    pub fn remove_edge(&mut self, from: &N, to: &N) -> Option<bool> {
        let is_required = self.successors.get_mut(from)?.shift_remove(to)?;
        if let Some(incoming) = self.predecessors.get_mut(to) {
            incoming.shift_remove(from);
        }
        Some(is_required)
    }

    pub fn has_node(&self, node: &N) -> bool {
        self.successors.contains_key(node)
    }

    pub fn edge(&self, from: &N, to: &N) -> Option<bool> {
        self.successors.get(from)?.get(to).copied()
    }

    pub fn has_edge(&self, from: &N, to: &N) -> bool {
        self.edge(from, to).is_some()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.successors.keys()
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.values().map(IndexMap::len).sum()
    }

    /// Outgoing edges of `node` as `(target, is_required)`.
    pub fn out_edges<'a>(&'a self, node: &N) -> impl Iterator<Item = (&'a N, bool)> + 'a {
        self.successors
            .get(node)
            .into_iter()
            .flat_map(|out| out.iter().map(|(to, required)| (to, *required)))
    }

    pub fn successors<'a>(&'a self, node: &N) -> impl Iterator<Item = &'a N> + 'a {
        self.successors.get(node).into_iter().flat_map(IndexMap::keys)
    }

    pub fn predecessors<'a>(&'a self, node: &N) -> impl Iterator<Item = &'a N> + 'a {
        self.predecessors.get(node).into_iter().flat_map(IndexSet::iter)
    }

    /// Nodes without outgoing edges, in node order.
    pub fn sinks(&self) -> impl Iterator<Item = &N> {
        self.successors
            .iter()
            .filter(|(_, out)| out.is_empty())
            .map(|(node, _)| node)
    }

    /// Orders nodes so every edge source precedes its target.
    ///
    /// Depth-first from each sink (in node order) through predecessors (in
    /// edge order), emitting nodes in post-order. Returns `None` if the graph
    /// has a cycle.
    pub fn topological_sort(&self) -> Option<Vec<N>> {
        let mut sorter = TopoSorter {
            graph: self,
            visited: IndexSet::new(),
            on_path: IndexSet::new(),
            order: Vec::with_capacity(self.node_count()),
        };
        for sink in self.sinks() {
            sorter.visit(sink)?;
        }
        if sorter.visited.len() != self.node_count() {
            return None;
        }
        Some(sorter.order)
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_sort().is_some()
    }

    /// Strongly connected components that contain a cycle: more than one
    /// node, or a single node with a self edge.
    ///
    /// Components come out in the order Tarjan's algorithm completes them,
    /// each listed in stack-pop order.
    pub fn find_cycles(&self) -> Vec<Vec<N>> {
        SccFinder::find(self)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.has_edge(single, single),
                _ => true,
            })
            .collect()
    }
}

struct TopoSorter<'g, N: GraphNode> {
    graph: &'g DependencyGraph<N>,
    visited: IndexSet<&'g N>,
    on_path: IndexSet<&'g N>,
    order: Vec<N>,
}

impl<'g, N: GraphNode> TopoSorter<'g, N> {
    /// Returns `None` when a node is reached again while still on the path.
    fn visit(&mut self, node: &'g N) -> Option<()> {
        if self.on_path.contains(node) {
            return None;
        }
        if !self.visited.insert(node) {
            return Some(());
        }
        self.on_path.insert(node);
        let graph = self.graph;
        for predecessor in graph.predecessors(node) {
            self.visit(predecessor)?;
        }
        self.on_path.shift_remove(node);
        self.order.push(node.clone());
        Some(())
    }
}

struct SccFinder<'g, N: GraphNode> {
    graph: &'g DependencyGraph<N>,
    index: usize,
    stack: Vec<&'g N>,
    on_stack: IndexSet<&'g N>,
    indices: IndexMap<&'g N, usize>,
    lowlinks: IndexMap<&'g N, usize>,
    components: Vec<Vec<N>>,
}

impl<'g, N: GraphNode> SccFinder<'g, N> {
    fn find(graph: &'g DependencyGraph<N>) -> Vec<Vec<N>> {
        let mut finder = Self {
            graph,
            index: 0,
            stack: Vec::new(),
            on_stack: IndexSet::new(),
            indices: IndexMap::new(),
            lowlinks: IndexMap::new(),
            components: Vec::new(),
        };

        for node in graph.nodes() {
            if !finder.indices.contains_key(node) {
                finder.strongconnect(node);
            }
        }

        finder.components
    }

    fn strongconnect(&mut self, node: &'g N) {
        self.indices.insert(node, self.index);
        self.lowlinks.insert(node, self.index);
        self.index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let graph = self.graph;
        for successor in graph.successors(node) {
            if !self.indices.contains_key(successor) {
                self.strongconnect(successor);
                let lowest = self.lowlinks[successor].min(self.lowlinks[node]);
                self.lowlinks.insert(node, lowest);
            } else if self.on_stack.contains(successor) {
                let lowest = self.indices[successor].min(self.lowlinks[node]);
                self.lowlinks.insert(node, lowest);
            }
        }

        if self.lowlinks[node] == self.indices[node] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.shift_remove(member);
                component.push(member.clone());
                if member == node {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}
