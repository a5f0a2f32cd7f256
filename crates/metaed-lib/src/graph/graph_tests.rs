use super::*;

fn graph(edges: &[(&'static str, &'static str, bool)]) -> DependencyGraph<&'static str> {
    let mut graph = DependencyGraph::new();
    for (from, to, required) in edges {
        graph.set_edge(*from, *to, *required);
    }
    graph
}

#[test]
fn set_edge_inserts_source_before_target() {
    let graph = graph(&[("B", "C", false), ("A", "C", false)]);
    assert_eq!(graph.nodes().copied().collect::<Vec<_>>(), ["B", "C", "A"]);
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn add_node_keeps_existing_position() {
    let mut graph = graph(&[("A", "B", true)]);
    graph.add_node("C");
    graph.add_node("A");
    assert_eq!(graph.nodes().copied().collect::<Vec<_>>(), ["A", "B", "C"]);
}

#[test]
fn set_edge_twice_updates_flag() {
    let mut graph = graph(&[("A", "B", false)]);
    graph.set_edge("A", "B", true);
    assert_eq!(graph.edge(&"A", &"B"), Some(true));
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.predecessors(&"B").count(), 1);
}

#[test]
fn predecessors_follow_edge_order() {
    let graph = graph(&[("B", "C", false), ("A", "C", false), ("A", "B", false)]);
    assert_eq!(graph.predecessors(&"C").copied().collect::<Vec<_>>(), ["B", "A"]);
    assert_eq!(graph.successors(&"A").copied().collect::<Vec<_>>(), ["C", "B"]);
    assert_eq!(graph.sinks().copied().collect::<Vec<_>>(), ["C"]);
}

#[test]
fn remove_edge_reports_flag() {
    let mut graph = graph(&[("A", "B", true), ("A", "C", false)]);
    assert_eq!(graph.remove_edge(&"A", &"B"), Some(true));
    assert_eq!(graph.remove_edge(&"A", &"B"), None);
    assert_eq!(graph.remove_edge(&"X", &"B"), None);
    assert!(!graph.has_edge(&"A", &"B"));
    assert!(graph.has_node(&"B"));
    assert_eq!(graph.predecessors(&"B").count(), 0);
    assert_eq!(graph.out_edges(&"A").collect::<Vec<_>>(), [(&"C", false)]);
}

#[test]
fn topological_sort_places_sources_first() {
    let graph = graph(&[("B", "C", false), ("A", "C", false), ("A", "B", false)]);
    assert_eq!(graph.topological_sort(), Some(vec!["A", "B", "C"]));
}

#[test]
fn topological_sort_includes_isolated_nodes() {
    let mut graph = graph(&[("A", "B", true)]);
    graph.add_node("Z");
    assert_eq!(graph.topological_sort(), Some(vec!["A", "B", "Z"]));
}

#[test]
fn topological_sort_rejects_cycles() {
    let graph = graph(&[("A", "B", true), ("B", "A", true)]);
    assert_eq!(graph.topological_sort(), None);
    assert!(!graph.is_acyclic());

    let graph = graph_with_self_loop();
    assert_eq!(graph.topological_sort(), None);
}

fn graph_with_self_loop() -> DependencyGraph<&'static str> {
    graph(&[("A", "B", false), ("B", "B", true)])
}

#[test]
fn find_cycles_skips_trivial_components() {
    let graph = graph(&[("A", "B", false), ("B", "C", false)]);
    assert!(graph.find_cycles().is_empty());
}

#[test]
fn find_cycles_reports_self_loops() {
    assert_eq!(graph_with_self_loop().find_cycles(), vec![vec!["B"]]);
}

#[test]
fn find_cycles_lists_members_in_pop_order() {
    let graph = graph(&[("D", "E", true), ("E", "F", true), ("F", "D", true)]);
    assert_eq!(graph.find_cycles(), vec![vec!["F", "E", "D"]]);
}

#[test]
fn empty_graph() {
    let graph: DependencyGraph<&str> = DependencyGraph::new();
    assert_eq!(graph.topological_sort(), Some(vec![]));
    assert!(graph.find_cycles().is_empty());
    assert_eq!(graph.node_count(), 0);
}
