//! Batch dependency graph with cycle-tolerant topological ordering.

use std::collections::{HashMap, HashSet, VecDeque};

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::GraphError;
use crate::node::DependencyNode;
use crate::resolve::import_matches_path;

/// Dependency graph for the files created by one batch.
///
/// Nodes are kept in insertion order, which doubles as the tie-breaker for
/// ordering and as the fallback order for nodes caught in cycles. Edges are
/// resolved eagerly: registering a node resolves its own import targets
/// against every existing node and resolves every existing node's targets
/// against the newcomer.
#[derive(Debug, Clone)]
pub struct DependencyGraph<M = ()> {
    /// Nodes in insertion order.
    nodes: Vec<DependencyNode<M>>,
    /// Position of each node in `nodes`, keyed by path.
    index: HashMap<Utf8PathBuf, usize>,
}

impl<M> Default for DependencyGraph<M> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<M> DependencyGraph<M> {
    /// Creates a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a path with its raw import targets and metadata.
    ///
    /// Registering a path twice replaces the earlier targets and metadata but
    /// keeps the original insertion position.
    pub fn add_node<I, S>(&mut self, path: impl Into<Utf8PathBuf>, import_targets: I, metadata: M)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = path.into();
        let targets: Vec<String> = import_targets.into_iter().map(Into::into).collect();

        let position = if let Some(&existing) = self.index.get(&path) {
            if let Some(node) = self.nodes.get_mut(existing) {
                node.replace(targets, metadata);
            }
            existing
        } else {
            let position = self.nodes.len();
            self.nodes
                .push(DependencyNode::new(path.clone(), targets, metadata));
            self.index.insert(path.clone(), position);
            position
        };

        self.resolve_outgoing(position);
        self.resolve_incoming(&path);
    }

    /// Returns the node registered for `path`.
    #[must_use]
    pub fn node(&self, path: &Utf8Path) -> Option<&DependencyNode<M>> {
        self.index
            .get(path)
            .and_then(|&position| self.nodes.get(position))
    }

    /// Returns an iterator over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode<M>> {
        self.nodes.iter()
    }

    /// Returns the number of registered nodes.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of resolved dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.dependencies().len()).sum()
    }

    /// Returns whether the graph is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether a node is registered for `path`.
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.index.contains_key(path)
    }

    /// Returns registered paths so that each follows its dependencies.
    ///
    /// Nodes that cannot be ordered because they sit on (or behind) a cycle
    /// are appended in insertion order. Every registered node appears exactly
    /// once.
    #[must_use]
    pub fn topological_sort(&self) -> Vec<Utf8PathBuf> {
        self.ordered_nodes()
            .into_iter()
            .map(|node| node.path().to_path_buf())
            .collect()
    }

    /// Returns registered nodes in dependency order.
    ///
    /// This is the node-level form of [`Self::topological_sort`], useful when
    /// callers need the metadata carried by each node.
    #[must_use]
    pub fn ordered_nodes(&self) -> Vec<&DependencyNode<M>> {
        let (ordered, leftover) = self.kahn_order();
        ordered
            .into_iter()
            .chain(leftover)
            .filter_map(|position| self.nodes.get(position))
            .collect()
    }

    /// Returns the paths that could not be ordered because of cycles.
    ///
    /// The result is in insertion order and is empty for acyclic graphs.
    #[must_use]
    pub fn cyclic_nodes(&self) -> Vec<&Utf8Path> {
        let (_, leftover) = self.kahn_order();
        leftover
            .into_iter()
            .filter_map(|position| self.nodes.get(position))
            .map(DependencyNode::path)
            .collect()
    }

    /// Returns the dependencies of `path`.
    ///
    /// With `direct_only` the resolved edges of the node are returned as is.
    /// Otherwise the transitive closure is walked breadth first; the walk
    /// visits each node at most once, so cycles terminate.
    ///
    /// # Errors
    /// Returns `GraphError::NodeNotFound` if `path` is not registered.
    pub fn get_dependencies(
        &self,
        path: &Utf8Path,
        direct_only: bool,
    ) -> Result<Vec<Utf8PathBuf>, GraphError> {
        let node = self
            .node(path)
            .ok_or_else(|| GraphError::node_not_found(path))?;

        if direct_only {
            return Ok(node.dependencies().to_vec());
        }

        let mut visited: HashSet<&Utf8Path> = HashSet::from([node.path()]);
        let mut queue: VecDeque<&Utf8Path> =
            node.dependencies().iter().map(Utf8PathBuf::as_path).collect();
        let mut closure = Vec::new();

        while let Some(current) = queue.pop_front() {
            if closure.len() >= self.nodes.len() || !visited.insert(current) {
                continue;
            }
            closure.push(current.to_path_buf());
            if let Some(next) = self.node(current) {
                queue.extend(next.dependencies().iter().map(Utf8PathBuf::as_path));
            }
        }

        Ok(closure)
    }

    /// Returns the paths that depend directly on `path`.
    pub fn dependents_of<'a>(&'a self, path: &'a Utf8Path) -> impl Iterator<Item = &'a Utf8Path> {
        self.nodes
            .iter()
            .filter(move |node| node.dependencies().iter().any(|dep| dep == path))
            .map(DependencyNode::path)
    }

    /// Kahn's algorithm over insertion positions.
    ///
    /// Returns the ordered positions and, separately, the positions left
    /// with unresolved in-degree (cycle members and their dependents).
    fn kahn_order(&self) -> (Vec<usize>, Vec<usize>) {
        let count = self.nodes.len();
        let mut in_degree = vec![0_usize; count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

        for (position, node) in self.nodes.iter().enumerate() {
            for dependency in node.dependencies() {
                let Some(&dep_position) = self.index.get(dependency) else {
                    continue;
                };
                if let Some(degree) = in_degree.get_mut(position) {
                    *degree += 1;
                }
                if let Some(list) = dependents.get_mut(dep_position) {
                    list.push(position);
                }
            }
        }

        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(position, _)| position)
            .collect();
        let mut emitted = vec![false; count];
        let mut ordered = Vec::with_capacity(count);

        while let Some(position) = queue.pop_front() {
            ordered.push(position);
            if let Some(flag) = emitted.get_mut(position) {
                *flag = true;
            }
            for &dependent in dependents.get(position).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        let leftover = (0..count)
            .filter(|position| !emitted.get(*position).copied().unwrap_or(true))
            .collect();
        (ordered, leftover)
    }

    /// Resolves the import targets of the node at `position` against every
    /// other registered path.
    fn resolve_outgoing(&mut self, position: usize) {
        let Some(node) = self.nodes.get(position) else {
            return;
        };
        let matches: Vec<Utf8PathBuf> = self
            .nodes
            .iter()
            .filter(|candidate| candidate.path() != node.path())
            .filter(|candidate| {
                node.import_targets()
                    .iter()
                    .any(|target| import_matches_path(target, candidate.path()))
            })
            .map(|candidate| candidate.path().to_path_buf())
            .collect();

        if let Some(node) = self.nodes.get_mut(position) {
            for dependency in &matches {
                node.add_dependency(dependency);
            }
        }
    }

    /// Re-evaluates every other node's import targets against `path`.
    fn resolve_incoming(&mut self, path: &Utf8Path) {
        for node in &mut self.nodes {
            if node.path() == path {
                continue;
            }
            let matched = node
                .import_targets()
                .iter()
                .any(|target| import_matches_path(target, path));
            if matched {
                node.add_dependency(path);
            } else {
                node.remove_dependency(path);
            }
        }
    }
}
