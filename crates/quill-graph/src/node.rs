//! Dependency graph node representation.

use camino::{Utf8Path, Utf8PathBuf};

/// A path registered in the dependency graph.
///
/// Nodes keep the raw import targets they were registered with so edges can
/// be re-resolved as further paths join the batch. Only targets that name
/// another registered path become dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode<M> {
    /// Path that identifies this node.
    path: Utf8PathBuf,
    /// Raw import strings as reported by the import extractor.
    import_targets: Vec<String>,
    /// Resolved in-batch dependencies, in discovery order.
    dependencies: Vec<Utf8PathBuf>,
    /// Caller-supplied payload carried through ordering.
    metadata: M,
}

impl<M> DependencyNode<M> {
    pub(crate) fn new(path: Utf8PathBuf, import_targets: Vec<String>, metadata: M) -> Self {
        Self {
            path,
            import_targets,
            dependencies: Vec::new(),
            metadata,
        }
    }

    /// Returns the path that identifies this node.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the raw import targets registered for this node.
    #[must_use]
    pub fn import_targets(&self) -> &[String] {
        &self.import_targets
    }

    /// Returns the resolved dependencies of this node.
    ///
    /// Every entry names another node registered in the same graph.
    #[must_use]
    pub fn dependencies(&self) -> &[Utf8PathBuf] {
        &self.dependencies
    }

    /// Returns the metadata supplied when the node was registered.
    #[must_use]
    pub const fn metadata(&self) -> &M {
        &self.metadata
    }

    pub(crate) fn add_dependency(&mut self, path: &Utf8Path) {
        if path != self.path && !self.dependencies.iter().any(|existing| existing == path) {
            self.dependencies.push(path.to_path_buf());
        }
    }

    pub(crate) fn remove_dependency(&mut self, path: &Utf8Path) {
        self.dependencies.retain(|existing| existing != path);
    }

    pub(crate) fn replace(&mut self, import_targets: Vec<String>, metadata: M) {
        self.import_targets = import_targets;
        self.dependencies.clear();
        self.metadata = metadata;
    }
}
