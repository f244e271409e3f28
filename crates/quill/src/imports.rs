//! Import discovery used to order file creation within a batch.

use camino::Utf8Path;
use tracing::debug;

const IMPORTS_TARGET: &str = "quill::imports";

/// Reports the raw import targets of a file about to be created.
///
/// Targets are matched heuristically against the other files of the batch,
/// so implementations may return anything that names a module: relative
/// specifiers, dotted or `::` paths converted to `/`, package names.
pub trait ImportExtractor: Send + Sync {
    /// Returns the import targets found in `content`.
    ///
    /// `path` is the file's destination and selects the language.
    fn extract_imports(&self, path: &Utf8Path, content: &str) -> Vec<String>;
}

/// [`ImportExtractor`] backed by the tree-sitter grammars in `quill-syntax`.
///
/// Files in unsupported languages, and files that fail to parse at all,
/// report no imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterImportExtractor;

impl ImportExtractor for TreeSitterImportExtractor {
    fn extract_imports(&self, path: &Utf8Path, content: &str) -> Vec<String> {
        match quill_syntax::extract_imports_for_path(path.as_std_path(), content) {
            Ok(targets) => targets,
            Err(error) => {
                debug!(
                    target: IMPORTS_TARGET,
                    path = %path,
                    error = %error,
                    "import extraction failed"
                );
                Vec::new()
            }
        }
    }
}
