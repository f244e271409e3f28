//! Error types for dependency graph queries.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors returned by dependency graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The requested path was never registered in the graph.
    #[error("node not found: {path}")]
    NodeNotFound {
        /// Path that was looked up.
        path: Utf8PathBuf,
    },
}

impl GraphError {
    /// Creates a new `NodeNotFound` error.
    #[must_use]
    pub fn node_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::NodeNotFound { path: path.into() }
    }
}
