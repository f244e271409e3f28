//! Behaviour-driven tests for batch dependency ordering.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::DependencyGraph;

#[derive(Default)]
struct TestWorld {
    graph: DependencyGraph,
    order: Vec<Utf8PathBuf>,
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

fn position(world: &TestWorld, path: &str) -> usize {
    world
        .order
        .iter()
        .position(|entry| entry.as_str() == path)
        .unwrap_or_else(|| panic!("{path} missing from order"))
}

#[given("a batch graph")]
fn given_graph(world: &RefCell<TestWorld>) {
    world.borrow_mut().graph = DependencyGraph::new();
}

#[given("the file {path} importing {target}")]
fn given_file_importing(world: &RefCell<TestWorld>, path: String, target: String) {
    let import = strip_quotes(&target);
    let targets: Vec<&str> = if import == "nothing" {
        Vec::new()
    } else {
        vec![import]
    };
    world
        .borrow_mut()
        .graph
        .add_node(strip_quotes(&path), targets, ());
}

#[when("the batch is ordered")]
fn when_ordered(world: &RefCell<TestWorld>) {
    let mut state = world.borrow_mut();
    state.order = state.graph.topological_sort();
}

#[then("{first} comes before {second}")]
fn then_comes_before(world: &RefCell<TestWorld>, first: String, second: String) {
    let state = world.borrow();
    assert!(position(&state, strip_quotes(&first)) < position(&state, strip_quotes(&second)));
}

#[then("the order holds {count} files")]
fn then_order_length(world: &RefCell<TestWorld>, count: usize) {
    assert_eq!(world.borrow().order.len(), count);
}

#[then("the graph reports {count} cyclic files")]
fn then_cyclic_count(world: &RefCell<TestWorld>, count: usize) {
    assert_eq!(world.borrow().graph.cyclic_nodes().len(), count);
}

#[scenario(
    path = "tests/features/dependency_graph.feature",
    name = "Imported files are ordered before their importers"
)]
fn imported_files_first(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dependency_graph.feature",
    name = "Circular imports still yield every file"
)]
fn circular_imports(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dependency_graph.feature",
    name = "External imports leave insertion order intact"
)]
fn external_imports(world: RefCell<TestWorld>) {
    let _ = world;
}
