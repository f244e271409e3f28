//! Lexical normalisation of directive paths against the workspace root.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

/// A directive path resolved against the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPath {
    path: Utf8PathBuf,
    outside_workspace: bool,
    explicit_absolute: bool,
}

impl NormalizedPath {
    /// Resolved absolute path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Whether the resolved path lies outside the workspace root.
    #[must_use]
    pub const fn outside_workspace(&self) -> bool {
        self.outside_workspace
    }

    /// Whether the directive spelled the path as absolute.
    #[must_use]
    pub const fn explicit_absolute(&self) -> bool {
        self.explicit_absolute
    }

    /// Consumes the value, returning the resolved path.
    #[must_use]
    pub fn into_path(self) -> Utf8PathBuf {
        self.path
    }
}

/// Resolves `raw` against `root`.
///
/// The result is deterministic and idempotent: normalising an already
/// normalised path returns it unchanged. Absolute inputs outside the root are
/// returned as written (after `.`/`..` collapsing) and flagged. Relative
/// inputs are joined to the root; if `..` segments carry them out of it they
/// are flagged as well.
///
/// When the root string occurs more than once, on component boundaries, only
/// the suffix starting at its last occurrence is kept. This repairs model
/// output that prefixes an already absolute path with the root.
#[must_use]
pub fn normalize(raw: &str, root: &Utf8Path) -> NormalizedPath {
    let root = collapse(&canonical_separators(root.as_str()));
    let candidate = expand_home(&canonical_separators(strip_quotes(raw)));

    if is_absolute(&candidate) {
        let resolved = collapse(&keep_last_root(&candidate, &root));
        let inside = is_within(&resolved, &root);
        return NormalizedPath {
            path: Utf8PathBuf::from(resolved),
            outside_workspace: !inside,
            explicit_absolute: true,
        };
    }

    let relative = strip_root_prefix(strip_current_dir(&candidate), &root);
    let joined = if relative.is_empty() {
        root.clone()
    } else {
        format!("{}/{relative}", root.trim_end_matches('/'))
    };
    let resolved = collapse(&keep_last_root(&collapse(&joined), &root));
    let inside = is_within(&resolved, &root);
    NormalizedPath {
        path: Utf8PathBuf::from(resolved),
        outside_workspace: !inside,
        explicit_absolute: false,
    }
}

fn strip_quotes(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|ch| matches!(ch, '"' | '\'' | '`'))
        .trim()
}

fn canonical_separators(path: &str) -> String {
    path.replace('\\', "/")
}

fn expand_home(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_owned(),
    };
    dirs::home_dir()
        .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
        .map_or_else(
            || path.to_owned(),
            |home| format!("{}{rest}", canonical_separators(home.as_str())),
        )
}

pub(crate) fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    let bytes = path.as_bytes();
    matches!(bytes, [drive, b':', b'/', ..] if drive.is_ascii_alphabetic())
}

fn strip_current_dir(path: &str) -> &str {
    let mut rest = path;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.trim_start_matches('/');
    }
    if rest == "." { "" } else { rest }
}

/// Drops a copy of the root written without its leading separator, as in
/// `home/user/ws/src/a.rs` for root `/home/user/ws`.
fn strip_root_prefix<'a>(path: &'a str, root: &str) -> &'a str {
    let bare_root = root.trim_start_matches('/');
    if bare_root.is_empty() || !bare_root.contains('/') {
        return path;
    }
    match path.strip_prefix(bare_root) {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => path,
    }
}

/// Byte offsets where `root` occurs in `path` on component boundaries.
fn root_occurrences(path: &str, root: &str) -> Vec<usize> {
    if root.is_empty() || root == "/" {
        return Vec::new();
    }
    path.match_indices(root)
        .filter(|(start, _)| {
            let before_ok = *start == 0
                || root.starts_with('/')
                || path.get(..*start).is_some_and(|before| before.ends_with('/'));
            let after = path.get(start + root.len()..).unwrap_or_default();
            before_ok && (after.is_empty() || after.starts_with('/'))
        })
        .map(|(start, _)| start)
        .collect()
}

fn keep_last_root(path: &str, root: &str) -> String {
    let occurrences = root_occurrences(path, root);
    match occurrences.as_slice() {
        [_, .., last] => path.get(*last..).unwrap_or(path).to_owned(),
        _ => path.to_owned(),
    }
}

pub(crate) fn is_within(path: &str, root: &str) -> bool {
    if root == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Collapses `.`, `..` and repeated separators lexically.
///
/// A leading `//` (UNC-style prefix) is preserved; `..` never climbs above
/// the filesystem root.
pub(crate) fn collapse(path: &str) -> String {
    let (prefix, rest) = if path.starts_with("//") && !path.starts_with("///") {
        ("//", path.get(2..).unwrap_or_default())
    } else if let Some(rest) = path.strip_prefix('/') {
        ("/", rest)
    } else {
        ("", path)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if prefix.is_empty() {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if prefix.is_empty() && joined.is_empty() {
        ".".to_owned()
    } else {
        format!("{prefix}{joined}")
    }
}
