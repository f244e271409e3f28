//! Unit tests for the quill-graph crate.

mod behaviour;

mod graph_tests {
    use camino::{Utf8Path, Utf8PathBuf};
    use rstest::rstest;

    use crate::{DependencyGraph, GraphError};

    fn no_imports() -> Vec<String> {
        Vec::new()
    }

    fn position_of(order: &[Utf8PathBuf], path: &str) -> usize {
        order
            .iter()
            .position(|entry| entry.as_str() == path)
            .unwrap_or_else(|| panic!("{path} missing from order {order:?}"))
    }

    #[test]
    fn empty_graph_sorts_to_nothing() {
        let graph: DependencyGraph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert!(graph.topological_sort().is_empty());
        assert!(graph.cyclic_nodes().is_empty());
    }

    #[test]
    fn dependency_precedes_importer_regardless_of_insertion_order() {
        let mut graph = DependencyGraph::new();
        graph.add_node("/ws/app.js", ["./utils"], ());
        graph.add_node("/ws/utils.js", no_imports(), ());

        let order = graph.topological_sort();
        assert_eq!(order.len(), 2);
        assert!(position_of(&order, "/ws/utils.js") < position_of(&order, "/ws/app.js"));
    }

    #[test]
    fn unrelated_nodes_keep_insertion_order() {
        let mut graph = DependencyGraph::new();
        for name in ["/ws/c.txt", "/ws/a.txt", "/ws/b.txt"] {
            graph.add_node(name, no_imports(), ());
        }

        let order: Vec<_> = graph
            .topological_sort()
            .into_iter()
            .map(Utf8PathBuf::into_string)
            .collect();
        assert_eq!(order, ["/ws/c.txt", "/ws/a.txt", "/ws/b.txt"]);
    }

    #[test]
    fn imports_outside_the_batch_create_no_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_node("/ws/app.js", ["react", "lodash"], ());
        graph.add_node("/ws/utils.js", no_imports(), ());

        assert_eq!(graph.edge_count(), 0);
        let app = graph.node(Utf8Path::new("/ws/app.js")).expect("app node");
        assert!(app.dependencies().is_empty());
        assert_eq!(app.import_targets().len(), 2);
    }

    #[test]
    fn self_imports_are_ignored() {
        let mut graph = DependencyGraph::new();
        graph.add_node("/ws/utils.js", ["./utils"], ());
        assert_eq!(graph.edge_count(), 0);
    }

    #[rstest]
    #[case::two_cycle(&[("/ws/a.js", "./b"), ("/ws/b.js", "./a")])]
    #[case::three_cycle(&[("/ws/a.js", "./b"), ("/ws/b.js", "./c"), ("/ws/c.js", "./a")])]
    #[case::cycle_with_tail(&[("/ws/a.js", "./b"), ("/ws/b.js", "./a"), ("/ws/c.js", "./a"), ("/ws/d.js", "")])]
    fn cyclic_graphs_return_every_node_once(#[case] nodes: &[(&str, &str)]) {
        let mut graph = DependencyGraph::new();
        for (path, import) in nodes {
            graph.add_node(*path, [*import], ());
        }

        let order = graph.topological_sort();
        assert_eq!(order.len(), nodes.len());
        for (path, _) in nodes {
            let occurrences = order.iter().filter(|entry| entry.as_str() == *path).count();
            assert_eq!(occurrences, 1, "{path} should appear exactly once");
        }
        assert!(!graph.cyclic_nodes().is_empty());
    }

    #[test]
    fn cycle_members_fall_back_to_insertion_order() {
        let mut graph = DependencyGraph::new();
        graph.add_node("/ws/solo.js", no_imports(), ());
        graph.add_node("/ws/b.js", ["./a"], ());
        graph.add_node("/ws/a.js", ["./b"], ());

        let order: Vec<_> = graph
            .topological_sort()
            .into_iter()
            .map(Utf8PathBuf::into_string)
            .collect();
        assert_eq!(order, ["/ws/solo.js", "/ws/b.js", "/ws/a.js"]);
    }

    #[test]
    fn re_registering_a_node_replaces_its_targets() {
        let mut graph = DependencyGraph::new();
        graph.add_node("/ws/a.js", ["./b"], 1);
        graph.add_node("/ws/b.js", no_imports(), 2);
        assert_eq!(graph.edge_count(), 1);

        graph.add_node("/ws/a.js", no_imports(), 3);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        let node = graph.node(Utf8Path::new("/ws/a.js")).expect("a node");
        assert_eq!(*node.metadata(), 3);
    }

    #[test]
    fn ordered_nodes_carry_metadata() {
        let mut graph = DependencyGraph::new();
        graph.add_node("/ws/app.py", ["models"], "app");
        graph.add_node("/ws/models.py", no_imports(), "models");

        let labels: Vec<_> = graph
            .ordered_nodes()
            .into_iter()
            .map(|node| *node.metadata())
            .collect();
        assert_eq!(labels, ["models", "app"]);
    }

    #[test]
    fn transitive_dependencies_tolerate_cycles() {
        let mut graph = DependencyGraph::new();
        graph.add_node("/ws/a.js", ["./b"], ());
        graph.add_node("/ws/b.js", ["./c"], ());
        graph.add_node("/ws/c.js", ["./a"], ());

        let direct = graph
            .get_dependencies(Utf8Path::new("/ws/a.js"), true)
            .expect("direct dependencies");
        assert_eq!(direct, [Utf8PathBuf::from("/ws/b.js")]);

        let transitive = graph
            .get_dependencies(Utf8Path::new("/ws/a.js"), false)
            .expect("transitive dependencies");
        assert_eq!(
            transitive,
            [Utf8PathBuf::from("/ws/b.js"), Utf8PathBuf::from("/ws/c.js")]
        );
    }

    #[test]
    fn dependencies_of_unknown_path_is_an_error() {
        let graph: DependencyGraph = DependencyGraph::new();
        let error = graph
            .get_dependencies(Utf8Path::new("/ws/missing.js"), true)
            .expect_err("lookup should fail");
        assert!(matches!(error, GraphError::NodeNotFound { .. }));
    }

    #[test]
    fn dependents_are_reported() {
        let mut graph = DependencyGraph::new();
        graph.add_node("/ws/utils.js", no_imports(), ());
        graph.add_node("/ws/app.js", ["./utils"], ());
        graph.add_node("/ws/cli.js", ["./utils"], ());

        let dependents: Vec<_> = graph
            .dependents_of(Utf8Path::new("/ws/utils.js"))
            .map(Utf8Path::as_str)
            .collect();
        assert_eq!(dependents, ["/ws/app.js", "/ws/cli.js"]);
    }
}
