//! Turns a parsed header and its body into an [`Action`].

use crate::action::{Action, ActionKind, RawSpan};
use crate::extract::grammar::{Directive, Header};

/// Filenames whose only purpose is to keep an otherwise empty directory.
const DIRECTORY_MARKERS: &[&str] = &[".gitkeep", ".keep", ".placeholder"];

/// Extensions that, written alone as a basename, mean the stem is missing.
const KNOWN_EXTENSIONS: &[&str] = &[
    "c", "cc", "cfg", "conf", "cpp", "cs", "css", "csv", "go", "h", "hpp", "htm", "html", "ini",
    "java", "js", "json", "jsx", "kt", "less", "md", "mjs", "php", "py", "rb", "rs", "sass",
    "scss", "sh", "sql", "svg", "swift", "toml", "ts", "tsx", "txt", "vue", "xml", "yaml", "yml",
];

/// Returns whether `basename` is a bare extension such as `.txt`.
///
/// Dotfiles that are meaningful on their own (`.env`, `.gitignore`) are not
/// extension-only.
#[must_use]
pub fn is_extension_only(basename: &str) -> bool {
    basename.strip_prefix('.').is_some_and(|extension| {
        let lowered = extension.to_ascii_lowercase();
        KNOWN_EXTENSIONS.contains(&lowered.as_str())
    })
}

/// Returns the final component of a slash- or backslash-separated path.
pub(crate) fn basename(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
}

/// Trims whitespace and wrapping quotes or backticks from an argument.
pub(crate) fn clean_argument(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|ch| matches!(ch, '"' | '\'' | '`'))
        .trim()
}

/// Builds the action described by `header` and `body`.
///
/// Returns `None` when the header lacks a usable argument or names an
/// extension-only file.
pub(crate) fn build_action(
    header: &Header<'_>,
    body: &str,
    span: RawSpan,
    is_extension_only: &dyn Fn(&str) -> bool,
) -> Option<Action> {
    let argument = clean_argument(header.argument);
    let kind = match header.directive {
        Directive::Unsupported => {
            return Some(Action::Unsupported {
                keyword: header.keyword.to_owned(),
                argument: argument_or_body(argument, body).to_owned(),
                span,
            });
        }
        Directive::Execute(kind) => kind,
    };

    match kind {
        ActionKind::CreateFile => {
            let path = non_empty(argument)?;
            if is_extension_only(basename(path)) {
                return None;
            }
            Some(create_file_or_directory(path, body, span))
        }
        ActionKind::ModifyFile => {
            let path = non_empty(argument)?;
            if is_extension_only(basename(path)) {
                return None;
            }
            Some(Action::ModifyFile {
                path: path.to_owned(),
                content: body.to_owned(),
                span,
            })
        }
        ActionKind::CreateDirectory => {
            let path = directory_path(non_empty(argument_or_body(argument, body))?);
            Some(Action::CreateDirectory { path, span })
        }
        ActionKind::DeleteFile => {
            let path = non_empty(argument_or_body(argument, body))?;
            if is_extension_only(basename(path)) {
                return None;
            }
            Some(Action::DeleteFile {
                path: path.to_owned(),
                span,
            })
        }
        ActionKind::DeleteDirectory => {
            let path = directory_path(non_empty(argument_or_body(argument, body))?);
            Some(Action::DeleteDirectory { path, span })
        }
        ActionKind::RunCommand => {
            let command = non_empty(argument).or_else(|| non_empty(body.trim()))?;
            Some(Action::RunCommand {
                command: command.to_owned(),
                span,
            })
        }
        ActionKind::Unsupported => None,
    }
}

/// Decides once, from the path and body alone, whether a `create-file`
/// directive really describes a directory.
fn create_file_or_directory(path: &str, body: &str, span: RawSpan) -> Action {
    let name = basename(path);
    if DIRECTORY_MARKERS.contains(&name) {
        let parent = path
            .trim_end_matches(['/', '\\'])
            .rsplit_once(['/', '\\'])
            .map_or(".", |(parent, _)| parent);
        let parent = if parent.is_empty() { "/" } else { parent };
        return Action::CreateDirectory {
            path: parent.to_owned(),
            span,
        };
    }
    if path.ends_with(['/', '\\']) || body.trim().is_empty() {
        return Action::CreateDirectory {
            path: directory_path(path),
            span,
        };
    }
    Action::CreateFile {
        path: path.to_owned(),
        content: body.to_owned(),
        span,
    }
}

fn argument_or_body<'a>(argument: &'a str, body: &'a str) -> &'a str {
    if argument.is_empty() {
        body.lines()
            .map(clean_argument)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
    } else {
        argument
    }
}

fn directory_path(path: &str) -> String {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        path.get(..1).unwrap_or_default().to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}
