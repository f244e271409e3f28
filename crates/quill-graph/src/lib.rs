//! Dependency ordering for batches of generated files.
//!
//! When a single response creates several source files, later files often
//! import earlier ones. This crate records those relationships and produces
//! an execution order in which every file follows the files it imports.
//!
//! Import targets are raw strings (module names, relative specifiers) and are
//! resolved heuristically against the other paths registered in the same
//! batch. An import that names nothing in the batch produces no edge, so the
//! graph never references a path that is absent from the batch.
//!
//! # Core Types
//!
//! - [`DependencyNode`] - A registered path with its resolved in-batch
//!   dependencies and caller-supplied metadata
//! - [`DependencyGraph`] - The batch graph with cycle-tolerant topological
//!   ordering
//!
//! # Example
//!
//! ```
//! use quill_graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("/ws/app.js", ["./utils"], ());
//! graph.add_node("/ws/utils.js", Vec::<String>::new(), ());
//!
//! let order = graph.topological_sort();
//! assert_eq!(order.first().map(|path| path.as_str()), Some("/ws/utils.js"));
//! ```

mod error;
mod graph;
mod node;
mod resolve;

pub use error::GraphError;
pub use graph::DependencyGraph;
pub use node::DependencyNode;
pub use resolve::import_matches_path;

#[cfg(test)]
mod tests;
