//! Workspace containment checks for normalised paths.

use camino::Utf8Path;
use thiserror::Error;

use super::normalize::{NormalizedPath, normalize};

/// Reasons a directive path is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathViolation {
    /// The path is empty after trimming.
    #[error("path is empty")]
    Empty,
    /// The path contains a NUL byte.
    #[error("path contains a NUL byte: {path:?}")]
    InvalidCharacter {
        /// Path as written in the directive.
        path: String,
    },
    /// `..` segments would carry the path out of the workspace.
    #[error("path traverses outside the workspace: {path}")]
    Traversal {
        /// Path as written in the directive.
        path: String,
    },
    /// An absolute path points outside the workspace and absolute paths are
    /// not allowed.
    #[error("absolute path outside the workspace: {path}")]
    OutsideWorkspace {
        /// Path as written in the directive.
        path: String,
    },
}

/// Checks `raw` against the workspace root and returns its normalised form.
///
/// Relative paths must stay inside the root. Absolute paths outside the root
/// are accepted only with `allow_absolute`, and even then may not contain
/// `..` segments.
///
/// # Errors
/// Returns the first [`PathViolation`] that applies.
pub fn validate(
    raw: &str,
    root: &Utf8Path,
    allow_absolute: bool,
) -> Result<NormalizedPath, PathViolation> {
    let normalized = normalize(raw.trim(), root);
    check(raw, &normalized, allow_absolute)?;
    Ok(normalized)
}

/// Applies the rules of [`validate`] to a path normalised earlier.
///
/// `normalized` must be the result of normalising `raw` against the same
/// root; callers that memoise normalisation use this to skip the work.
///
/// # Errors
/// Returns the first [`PathViolation`] that applies.
pub fn check(
    raw: &str,
    normalized: &NormalizedPath,
    allow_absolute: bool,
) -> Result<(), PathViolation> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathViolation::Empty);
    }
    if trimmed.contains('\0') {
        return Err(PathViolation::InvalidCharacter {
            path: trimmed.to_owned(),
        });
    }
    if !normalized.outside_workspace() {
        return Ok(());
    }

    if !normalized.explicit_absolute() {
        return Err(PathViolation::Traversal {
            path: trimmed.to_owned(),
        });
    }
    if !allow_absolute {
        return Err(PathViolation::OutsideWorkspace {
            path: trimmed.to_owned(),
        });
    }
    if has_parent_segment(trimmed) {
        return Err(PathViolation::Traversal {
            path: trimmed.to_owned(),
        });
    }
    Ok(())
}

fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}
