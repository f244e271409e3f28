//! Execution ordering for a batch.
//!
//! Directories come first so files have somewhere to land, then file
//! creations in dependency order, then everything else as extracted.

use std::collections::HashMap;

use camino::Utf8PathBuf;
use quill_graph::DependencyGraph;
use tracing::debug;

use crate::action::{Action, ActionKind};
use crate::imports::ImportExtractor;

const ORDER_TARGET: &str = "quill::order";

/// Returns action indices in execution order.
///
/// `resolve` maps a directive path to the absolute path used as its graph
/// node, so spellings that normalise to the same file share a node.
pub(crate) fn execution_order(
    actions: &[Action],
    imports: Option<&dyn ImportExtractor>,
    resolve: &dyn Fn(&str) -> Utf8PathBuf,
) -> Vec<usize> {
    let indices_of = |wanted: ActionKind| -> Vec<usize> {
        actions
            .iter()
            .enumerate()
            .filter(|(_, action)| action.kind() == wanted)
            .map(|(index, _)| index)
            .collect()
    };

    let directories = indices_of(ActionKind::CreateDirectory);
    let mut files = indices_of(ActionKind::CreateFile);
    if let Some(extractor) = imports.filter(|_| files.len() > 1) {
        files = dependency_order(actions, &files, extractor, resolve);
    }
    let remaining = actions
        .iter()
        .enumerate()
        .filter(|(_, action)| {
            !matches!(
                action.kind(),
                ActionKind::CreateDirectory | ActionKind::CreateFile
            )
        })
        .map(|(index, _)| index);

    directories.into_iter().chain(files).chain(remaining).collect()
}

struct FileGroup {
    path: Utf8PathBuf,
    indices: Vec<usize>,
    targets: Vec<String>,
}

fn dependency_order(
    actions: &[Action],
    files: &[usize],
    extractor: &dyn ImportExtractor,
    resolve: &dyn Fn(&str) -> Utf8PathBuf,
) -> Vec<usize> {
    let mut groups: Vec<FileGroup> = Vec::new();
    let mut positions: HashMap<Utf8PathBuf, usize> = HashMap::new();

    for &index in files {
        let Some(Action::CreateFile { path, content, .. }) = actions.get(index) else {
            continue;
        };
        let resolved = resolve(path);
        let targets = extractor.extract_imports(&resolved, content);
        if let Some(group) = positions
            .get(&resolved)
            .and_then(|&position| groups.get_mut(position))
        {
            group.indices.push(index);
            group.targets.extend(targets);
            continue;
        }
        positions.insert(resolved.clone(), groups.len());
        groups.push(FileGroup {
            path: resolved,
            indices: vec![index],
            targets,
        });
    }

    let mut graph = DependencyGraph::new();
    for group in groups {
        graph.add_node(group.path, group.targets, group.indices);
    }

    let cyclic = graph.cyclic_nodes();
    if !cyclic.is_empty() {
        debug!(
            target: ORDER_TARGET,
            cyclic = ?cyclic,
            "import cycle detected, falling back to extraction order for its members"
        );
    }
    debug!(
        target: ORDER_TARGET,
        files = graph.node_count(),
        edges = graph.edge_count(),
        "ordered file creations"
    );

    graph
        .ordered_nodes()
        .into_iter()
        .flat_map(|node| node.metadata().iter().copied())
        .collect()
}
