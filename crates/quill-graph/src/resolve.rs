//! Heuristic matching of raw import targets against batch paths.
//!
//! This is not a module resolver. A target such as `./utils`, `crate/utils`
//! or `pkg/helpers` is reduced to a slash-separated key and compared with the
//! extension-less form of each candidate path. A match must start on a path
//! component boundary and either end the path or be followed only by a
//! conventional module index file (`index`, `mod`, `__init__`, `lib`).

use camino::Utf8Path;

/// File stems that stand in for their parent directory when imported.
const MODULE_INDEX_STEMS: &[&str] = &["index", "mod", "__init__", "lib"];

/// Leading specifier prefixes that carry no path information.
const IGNORED_PREFIXES: &[&str] = &["./", "../", "@/", "~/", "/"];

/// Returns whether `target` plausibly refers to the file at `path`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use quill_graph::import_matches_path;
///
/// assert!(import_matches_path("./utils", Utf8Path::new("/ws/src/utils.js")));
/// assert!(import_matches_path("components", Utf8Path::new("/ws/components/index.ts")));
/// assert!(!import_matches_path("react", Utf8Path::new("/ws/src/reactor.js")));
/// ```
#[must_use]
pub fn import_matches_path(target: &str, path: &Utf8Path) -> bool {
    let Some(key) = import_key(target) else {
        return false;
    };
    let stem = strip_extension(&path.as_str().replace('\\', "/"));
    matches_on_boundary(&stem, &key)
}

fn import_key(target: &str) -> Option<String> {
    let unquoted = target
        .trim()
        .trim_matches(|ch: char| matches!(ch, '"' | '\'' | '`'))
        .replace('\\', "/");

    let mut remainder = unquoted.as_str();
    while let Some(stripped) = IGNORED_PREFIXES
        .iter()
        .find_map(|prefix| remainder.strip_prefix(prefix))
    {
        remainder = stripped;
    }

    let key = strip_extension(remainder.trim_end_matches('/'));
    if key.is_empty() || key == "." || key == ".." {
        return None;
    }
    Some(key)
}

fn strip_extension(path: &str) -> String {
    let (directory, name) = match path.rsplit_once('/') {
        Some((directory, name)) => (Some(directory), name),
        None => (None, path),
    };
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    match directory {
        Some(directory) => format!("{directory}/{stem}"),
        None => stem.to_owned(),
    }
}

fn matches_on_boundary(stem: &str, key: &str) -> bool {
    stem.match_indices(key).any(|(start, matched)| {
        let starts_on_boundary = start == 0
            || stem
                .get(..start)
                .is_some_and(|before| before.ends_with('/'));
        let after = stem.get(start + matched.len()..).unwrap_or_default();
        let ends_on_boundary = after.is_empty()
            || MODULE_INDEX_STEMS
                .iter()
                .any(|index| after.strip_prefix('/') == Some(*index));
        starts_on_boundary && ends_on_boundary
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("./utils", "/ws/utils.js")]
    #[case("../lib/helpers", "/ws/src/lib/helpers.ts")]
    #[case("utils", "/ws/src/utils/index.js")]
    #[case("models/user", "/ws/app/models/user.py")]
    #[case("@/components/Button", "/ws/src/components/Button.tsx")]
    #[case("\"./styles.css\"", "/ws/styles.css")]
    #[case("parser", "/ws/src/parser/mod.rs")]
    fn matches_batch_paths(#[case] target: &str, #[case] path: &str) {
        assert!(import_matches_path(target, Utf8Path::new(path)));
    }

    #[rstest]
    #[case("react", "/ws/src/reactor.js")]
    #[case("utils", "/ws/src/myutils.js")]
    #[case("utils", "/ws/src/utils/helpers.js")]
    #[case("./", "/ws/index.js")]
    #[case("", "/ws/a.js")]
    fn rejects_unrelated_paths(#[case] target: &str, #[case] path: &str) {
        assert!(!import_matches_path(target, Utf8Path::new(path)));
    }
}
