//! Header grammar for fenced directive blocks.
//!
//! A header is a fence opener (three or more backticks or tildes, indented by
//! at most three spaces) followed by a directive keyword and an optional
//! argument separated by `:` or whitespace:
//!
//! ```text
//! ```create-file: src/app.js
//! ~~~~ Delete_Directory build
//! ```
//!
//! All spellings are driven by [`KEYWORDS`]; matching is ASCII
//! case-insensitive and accepts `_` wherever the table uses `-`.

use crate::action::ActionKind;

/// What a recognised keyword asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Directive {
    /// An executable action of the given kind.
    Execute(ActionKind),
    /// A recognised directive with no executor.
    Unsupported,
}

/// Every accepted keyword spelling, in canonical kebab-case.
const KEYWORDS: &[(&str, Directive)] = &[
    ("create-file", Directive::Execute(ActionKind::CreateFile)),
    ("create-directory", Directive::Execute(ActionKind::CreateDirectory)),
    ("create-folder", Directive::Execute(ActionKind::CreateDirectory)),
    ("create-dir", Directive::Execute(ActionKind::CreateDirectory)),
    ("modify-file", Directive::Execute(ActionKind::ModifyFile)),
    ("update-file", Directive::Execute(ActionKind::ModifyFile)),
    ("edit-file", Directive::Execute(ActionKind::ModifyFile)),
    ("delete-file", Directive::Execute(ActionKind::DeleteFile)),
    ("remove-file", Directive::Execute(ActionKind::DeleteFile)),
    ("delete-directory", Directive::Execute(ActionKind::DeleteDirectory)),
    ("delete-folder", Directive::Execute(ActionKind::DeleteDirectory)),
    ("remove-directory", Directive::Execute(ActionKind::DeleteDirectory)),
    ("run-command", Directive::Execute(ActionKind::RunCommand)),
    ("rename-file", Directive::Unsupported),
    ("move-file", Directive::Unsupported),
    ("copy-file", Directive::Unsupported),
];

/// Largest indentation a fence opener may carry.
const MAX_FENCE_INDENT: usize = 3;

/// Shortest run of fence characters that opens or closes a block.
const MIN_FENCE_LEN: usize = 3;

/// Fence that opened a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fence {
    marker: char,
    len: usize,
}

/// A parsed header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header<'a> {
    pub(crate) fence: Fence,
    pub(crate) directive: Directive,
    pub(crate) keyword: &'static str,
    pub(crate) argument: &'a str,
    pub(crate) indent: usize,
}

/// Parses `line` as a directive header.
pub(crate) fn parse_header(line: &str) -> Option<Header<'_>> {
    let content = trim_line(line);
    let indent = content.len() - content.trim_start_matches(' ').len();
    if indent > MAX_FENCE_INDENT {
        return None;
    }
    let rest = content.get(indent..)?;
    let marker = rest.chars().next().filter(|ch| matches!(ch, '`' | '~'))?;
    let after_fence = rest.trim_start_matches(marker);
    let len = rest.len() - after_fence.len();
    if len < MIN_FENCE_LEN {
        return None;
    }

    let info = after_fence.trim_start_matches([' ', '\t']);
    KEYWORDS.iter().find_map(|&(keyword, directive)| {
        let remainder = strip_keyword(info, keyword)?;
        let argument = split_argument(remainder)?;
        Some(Header {
            fence: Fence { marker, len },
            directive,
            keyword,
            argument,
            indent,
        })
    })
}

/// Returns whether `line` closes a block opened by `fence`.
pub(crate) fn is_closing_fence(line: &str, fence: Fence) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= fence.len && trimmed.chars().all(|ch| ch == fence.marker)
}

/// Returns whether `line` is made of fence characters only.
pub(crate) fn is_bare_fence(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= MIN_FENCE_LEN
        && (trimmed.chars().all(|ch| ch == '`') || trimmed.chars().all(|ch| ch == '~'))
}

/// Strips the line terminator from `line`.
pub(crate) fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn strip_keyword<'a>(info: &'a str, keyword: &str) -> Option<&'a str> {
    let candidate = info.get(..keyword.len())?;
    let matches = candidate
        .chars()
        .map(|ch| if ch == '_' { '-' } else { ch.to_ascii_lowercase() })
        .eq(keyword.chars());
    if matches {
        info.get(keyword.len()..)
    } else {
        None
    }
}

/// Splits the text after a keyword into the header argument.
///
/// The keyword must be followed by the end of the line, whitespace or `:`.
fn split_argument(remainder: &str) -> Option<&str> {
    match remainder.chars().next() {
        None => Some(""),
        Some(':') => remainder.get(1..).map(str::trim),
        Some(ch) if ch.is_whitespace() => {
            let spaced = remainder.trim_start();
            Some(spaced.strip_prefix(':').unwrap_or(spaced).trim())
        }
        Some(_) => None,
    }
}
