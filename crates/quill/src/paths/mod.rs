//! Path normalisation and workspace security checks.
//!
//! Directive paths arrive in many shapes: quoted, with backslashes, with a
//! `~` prefix, repeating the workspace root, or climbing out of it with
//! `..`. [`normalize`] turns any of them into one absolute path and flags,
//! rather than redirects, paths that land outside the workspace.
//! [`validate`] decides whether a path may be written at all.

mod normalize;
mod validate;

pub use normalize::{NormalizedPath, normalize};
pub use validate::{PathViolation, check, validate};
