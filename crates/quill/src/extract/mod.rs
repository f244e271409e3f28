//! Directive extraction from free-form model output.
//!
//! Extraction runs in two passes over the text. The standard pass pairs each
//! header with its closing fence. The fallback pass then recovers
//! `create-file` headers that were left unclosed because another header
//! appeared first, taking their body up to the next header or the end of the
//! text. Results are merged in document order and de-duplicated by kind and
//! target, keeping the first occurrence.

mod classify;
mod fallback;
mod grammar;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::action::{Action, ActionKind, RawSpan};

pub use classify::is_extension_only;

use classify::build_action;
use grammar::{Header, is_closing_fence, parse_header, trim_line};

/// Tracing target for extraction.
const EXTRACT_TARGET: &str = "quill::extract";

/// Predicate deciding whether a basename is a bare extension.
pub type ExtensionPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Parses model output into an ordered, de-duplicated list of actions.
///
/// Extraction never fails: text without recognisable directives yields an
/// empty list.
#[derive(Clone)]
pub struct ActionExtractor {
    is_extension_only: ExtensionPredicate,
}

impl fmt::Debug for ActionExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionExtractor").finish_non_exhaustive()
    }
}

impl Default for ActionExtractor {
    fn default() -> Self {
        Self {
            is_extension_only: Arc::new(is_extension_only),
        }
    }
}

impl ActionExtractor {
    /// Creates an extractor with the default extension-only predicate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the predicate used to drop extension-only basenames.
    #[must_use]
    pub fn with_extension_predicate(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_extension_only = Arc::new(predicate);
        self
    }

    /// Extracts every recognised directive from `text` in document order.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<Action> {
        let lines = Line::split(text);
        let standard = self.standard_pass(text, &lines);

        let recovered = {
            let claimed: HashSet<&str> = standard
                .actions
                .iter()
                .filter_map(Action::path)
                .collect();
            fallback::recover_unclosed(
                text,
                &lines,
                &standard.unclosed,
                &claimed,
                self.is_extension_only.as_ref(),
            )
        };

        let recovered_count = recovered.len();
        let mut merged: Vec<Action> = standard.actions;
        merged.extend(recovered);
        merged.sort_by_key(|action| action.span().start());
        let actions = dedup(merged);

        debug!(
            target: EXTRACT_TARGET,
            actions = actions.len(),
            recovered = recovered_count,
            "extracted directives"
        );
        actions
    }

    fn standard_pass(&self, text: &str, lines: &[Line<'_>]) -> StandardPass {
        let mut pass = StandardPass::default();
        let mut index = 0;

        while let Some(line) = lines.get(index) {
            let Some(header) = parse_header(line.text) else {
                index += 1;
                continue;
            };

            let Some(close) = find_closing(lines, index + 1, &header) else {
                pass.unclosed.push(index);
                index += 1;
                continue;
            };

            let body = lines.get(index + 1..close).map(body_text).unwrap_or_default();
            let span_end = lines
                .get(close)
                .map_or(text.len(), |closing| closing.start + trim_line(closing.text).len());
            let span = RawSpan::new(text, line.start + header.indent, span_end);
            if let Some(action) =
                build_action(&header, &body, span, self.is_extension_only.as_ref())
            {
                pass.actions.push(action);
            }
            index = close + 1;
        }

        pass
    }
}

#[derive(Default)]
struct StandardPass {
    actions: Vec<Action>,
    /// Line indices of headers that never met their closing fence.
    unclosed: Vec<usize>,
}

/// A source line with its byte offset; `text` keeps its terminator.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    text: &'a str,
}

impl<'a> Line<'a> {
    fn split(text: &'a str) -> Vec<Self> {
        let mut offset = 0;
        text.split_inclusive('\n')
            .map(|line| {
                let start = offset;
                offset += line.len();
                Self { start, text: line }
            })
            .collect()
    }
}

/// Finds the closing fence for `header`, giving up at the next header.
fn find_closing(lines: &[Line<'_>], from: usize, header: &Header<'_>) -> Option<usize> {
    for (index, line) in lines.iter().enumerate().skip(from) {
        if is_closing_fence(line.text, header.fence) {
            return Some(index);
        }
        if parse_header(line.text).is_some() {
            return None;
        }
    }
    None
}

/// Joins body lines, dropping one leading blank line and the final line
/// terminator.
fn body_text(lines: &[Line<'_>]) -> String {
    let skip = usize::from(lines.first().is_some_and(|line| line.text.trim().is_empty()));
    let body: String = lines.iter().skip(skip).map(|line| line.text).collect();
    match body.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest).to_owned(),
        None => body,
    }
}

fn dedup(actions: Vec<Action>) -> Vec<Action> {
    let mut seen: HashSet<(ActionKind, String, String)> = HashSet::new();
    actions
        .into_iter()
        .filter(|action| {
            let (kind, target, extra) = action.dedup_key();
            seen.insert((kind, target.to_owned(), extra.to_owned()))
        })
        .collect()
}
