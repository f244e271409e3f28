//! Recovery of `create-file` headers left without a closing fence.

use std::collections::HashSet;

use crate::action::{Action, ActionKind, RawSpan};
use crate::extract::classify::{build_action, clean_argument};
use crate::extract::grammar::{Directive, is_bare_fence, parse_header, trim_line};
use crate::extract::{Line, body_text};

/// Builds actions for unclosed `create-file` headers.
///
/// Each recovered body runs from the line after the header to the line
/// before the next header, or to the end of the text. Trailing blank lines
/// and stray fences are dropped. Paths already produced by the standard pass
/// are skipped.
pub(super) fn recover_unclosed(
    text: &str,
    lines: &[Line<'_>],
    unclosed: &[usize],
    claimed: &HashSet<&str>,
    is_extension_only: &dyn Fn(&str) -> bool,
) -> Vec<Action> {
    unclosed
        .iter()
        .filter_map(|&index| {
            let line = lines.get(index)?;
            let header = parse_header(line.text)?;
            if header.directive != Directive::Execute(ActionKind::CreateFile)
                || claimed.contains(clean_argument(header.argument))
            {
                return None;
            }

            let next_header = lines
                .iter()
                .enumerate()
                .skip(index + 1)
                .find(|(_, candidate)| parse_header(candidate.text).is_some())
                .map_or(lines.len(), |(position, _)| position);
            let mut body_lines = lines.get(index + 1..next_header).unwrap_or_default();
            while let Some((last, rest)) = body_lines.split_last() {
                if last.text.trim().is_empty() || is_bare_fence(last.text) {
                    body_lines = rest;
                } else {
                    break;
                }
            }

            let end_line = body_lines.last().unwrap_or(line);
            let span_end = end_line.start + trim_line(end_line.text).len();
            let span = RawSpan::new(text, line.start + header.indent, span_end);
            build_action(&header, &body_text(body_lines), span, is_extension_only)
        })
        .collect()
}
