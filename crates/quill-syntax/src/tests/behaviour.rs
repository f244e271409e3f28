//! Behaviour-driven tests for import discovery.

use std::cell::RefCell;
use std::path::PathBuf;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::extract_imports_for_path;

/// State shared across BDD steps.
#[derive(Default)]
struct TestWorld {
    /// File under test (path, content).
    file: Option<(PathBuf, String)>,
    /// Targets discovered in the file.
    imports: Vec<String>,
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

/// Strips surrounding double quotes from a string if present.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

#[given("a file {filename} with content {content}")]
fn given_file(world: &RefCell<TestWorld>, filename: String, content: String) {
    world.borrow_mut().file = Some((
        PathBuf::from(strip_quotes(&filename)),
        strip_quotes(&content).to_owned(),
    ));
}

#[when("imports are extracted")]
fn when_extracted(world: &RefCell<TestWorld>) {
    let mut w = world.borrow_mut();
    let (path, content) = w.file.clone().expect("file configured");
    w.imports = extract_imports_for_path(&path, &content).expect("extraction succeeds");
}

#[then("the imports are {expected}")]
fn then_imports(world: &RefCell<TestWorld>, expected: String) {
    let targets: Vec<&str> = strip_quotes(&expected).split(',').collect();
    assert_eq!(world.borrow().imports, targets);
}

#[then("no imports are reported")]
fn then_no_imports(world: &RefCell<TestWorld>) {
    assert!(world.borrow().imports.is_empty());
}

#[scenario(
    path = "tests/features/import_extraction.feature",
    name = "JavaScript relative imports are discovered"
)]
fn javascript_relative_imports(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/import_extraction.feature",
    name = "Python package imports are discovered"
)]
fn python_package_imports(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/import_extraction.feature",
    name = "Files without a grammar have no imports"
)]
fn files_without_grammar(world: RefCell<TestWorld>) {
    drop(world);
}
