//! Execution outcomes and the rendered report.

use serde::Serialize;

use crate::action::{Action, ActionKind, RawSpan};
use crate::error::ErrorKind;

/// Maximum number of characters of command output kept in a status block.
pub(crate) const OUTPUT_TAIL_CHARS: usize = 2_000;

/// Result of executing one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    /// Position of the action in extraction order.
    pub action_index: usize,
    /// Kind of the action.
    pub kind: ActionKind,
    /// Path, command or argument the action targeted.
    pub target: String,
    /// Whether the action achieved its effect.
    pub success: bool,
    /// Whether the action was deliberately not executed.
    pub skipped: bool,
    /// Human-readable summary.
    pub message: String,
    /// Failure or annotation classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Tail of captured command output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ExecutionOutcome {
    pub(crate) fn succeeded(index: usize, action: &Action, message: impl Into<String>) -> Self {
        Self {
            action_index: index,
            kind: action.kind(),
            target: action.target().to_owned(),
            success: true,
            skipped: false,
            message: message.into(),
            error_kind: None,
            output: None,
        }
    }

    pub(crate) fn failed(
        index: usize,
        action: &Action,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error_kind: Some(kind),
            ..Self::succeeded(index, action, message)
        }
    }

    pub(crate) fn skipped(index: usize, action: &Action, message: impl Into<String>) -> Self {
        Self {
            success: false,
            skipped: true,
            error_kind: Some(ErrorKind::UnknownActionKind),
            ..Self::succeeded(index, action, message)
        }
    }

    pub(crate) fn annotated(mut self, kind: ErrorKind) -> Self {
        self.error_kind = Some(kind);
        self
    }

    pub(crate) fn with_output(mut self, output: Option<String>) -> Self {
        self.output = output.filter(|text| !text.trim().is_empty());
        self
    }

    /// Status line (and, for commands, output block) that replaces the
    /// action's source block.
    #[must_use]
    pub fn status_block(&self) -> String {
        let tag = if self.skipped {
            "skipped"
        } else if self.success {
            "ok"
        } else {
            "error"
        };
        let mut block = format!("[{tag}] {}", self.message);
        if let Some(output) = &self.output {
            block.push_str("\n```\n");
            block.push_str(output.trim_end());
            block.push_str("\n```");
        }
        block
    }
}

/// Summary of one `process` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Input text with every action block replaced by its status.
    pub processed_text: String,
    /// Actions that were attempted, successfully or not.
    pub actions_executed: usize,
    /// Outcomes with `success == true`.
    pub success_count: usize,
    /// Outcomes that failed.
    pub error_count: usize,
    /// Actions extracted from the input.
    pub total_actions: usize,
    /// Files created.
    pub create_file_count: usize,
    /// Directories created.
    pub directory_count: usize,
    /// Outcomes in execution order.
    pub outcomes: Vec<ExecutionOutcome>,
}

impl Report {
    /// Builds the report for `outcomes` of `actions` extracted from `text`.
    #[must_use]
    pub fn build(text: &str, actions: &[Action], outcomes: Vec<ExecutionOutcome>) -> Self {
        let success_count = outcomes.iter().filter(|outcome| outcome.success).count();
        let error_count = outcomes
            .iter()
            .filter(|outcome| !outcome.success && !outcome.skipped)
            .count();
        let count_successful = |kinds: &[ActionKind]| {
            outcomes
                .iter()
                .filter(|outcome| outcome.success && kinds.contains(&outcome.kind))
                .count()
        };

        Self {
            processed_text: substitute(text, actions, &outcomes),
            actions_executed: success_count + error_count,
            success_count,
            error_count,
            total_actions: actions.len(),
            create_file_count: count_successful(&[ActionKind::CreateFile]),
            directory_count: count_successful(&[ActionKind::CreateDirectory]),
            outcomes,
        }
    }

    /// Returns whether no directive was recognised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_actions == 0
    }
}

/// Replaces each action's source block with its status block.
///
/// Spans are applied back to front so earlier offsets stay valid. A span
/// whose recorded text no longer matches falls back to replacing the first
/// exact occurrence of that text.
fn substitute(text: &str, actions: &[Action], outcomes: &[ExecutionOutcome]) -> String {
    let mut replacements: Vec<(&RawSpan, String)> = outcomes
        .iter()
        .filter_map(|outcome| {
            actions
                .get(outcome.action_index)
                .map(|action| (action.span(), outcome.status_block()))
        })
        .collect();
    replacements.sort_by_key(|(span, _)| std::cmp::Reverse(span.start()));

    let mut processed = text.to_owned();
    for (span, block) in replacements {
        if span.text().is_empty() {
            continue;
        }
        if processed.get(span.start()..span.end()) == Some(span.text()) {
            processed.replace_range(span.start()..span.end(), &block);
        } else {
            processed = processed.replacen(span.text(), &block, 1);
        }
    }
    processed
}

/// Keeps the last [`OUTPUT_TAIL_CHARS`] characters of combined output.
pub(crate) fn output_tail(stdout: &str, stderr: &str) -> Option<String> {
    let combined = match (stdout.trim_end(), stderr.trim_end()) {
        ("", "") => return None,
        (out, "") => out.to_owned(),
        ("", err) => err.to_owned(),
        (out, err) => format!("{out}\n{err}"),
    };
    let count = combined.chars().count();
    if count <= OUTPUT_TAIL_CHARS {
        return Some(combined);
    }
    let tail: String = combined.chars().skip(count - OUTPUT_TAIL_CHARS).collect();
    Some(format!("...{tail}"))
}
