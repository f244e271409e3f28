//! Parsed directives.
//!
//! An [`Action`] is one instruction recovered from model output. Every action
//! remembers the exact source span it came from so the report can replace
//! that span with a status line.

use serde::Serialize;
use strum::{Display, EnumString};

/// Byte range and text of the block that produced an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSpan {
    start: usize,
    end: usize,
    text: String,
}

impl RawSpan {
    /// Builds a span covering `source[start..end]`.
    ///
    /// Offsets that do not fall on character boundaries of `source` produce
    /// an empty text; substitution then falls back to no-op.
    #[must_use]
    pub fn new(source: &str, start: usize, end: usize) -> Self {
        let text = source.get(start..end).unwrap_or_default().to_owned();
        Self { start, end, text }
    }

    /// Offset of the first byte of the block.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Offset one past the last byte of the block.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Source text of the block.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Kinds of directive recognised in model output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ActionKind {
    /// Write a new file.
    CreateFile,
    /// Create a directory and its parents.
    CreateDirectory,
    /// Overwrite an existing file, keeping a backup.
    ModifyFile,
    /// Remove a single file.
    DeleteFile,
    /// Remove a directory tree.
    DeleteDirectory,
    /// Run a shell command in the workspace root.
    RunCommand,
    /// A recognised directive that this system does not execute.
    Unsupported,
}

/// One instruction extracted from model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write `content` to `path`.
    CreateFile {
        /// Path as written in the directive.
        path: String,
        /// File body.
        content: String,
        /// Source block.
        span: RawSpan,
    },
    /// Create `path` as a directory.
    CreateDirectory {
        /// Path as written in the directive.
        path: String,
        /// Source block.
        span: RawSpan,
    },
    /// Replace the content of `path`.
    ModifyFile {
        /// Path as written in the directive.
        path: String,
        /// Replacement body.
        content: String,
        /// Source block.
        span: RawSpan,
    },
    /// Delete the file at `path`.
    DeleteFile {
        /// Path as written in the directive.
        path: String,
        /// Source block.
        span: RawSpan,
    },
    /// Delete the directory tree at `path`.
    DeleteDirectory {
        /// Path as written in the directive.
        path: String,
        /// Source block.
        span: RawSpan,
    },
    /// Run `command` through the shell.
    RunCommand {
        /// Command line.
        command: String,
        /// Source block.
        span: RawSpan,
    },
    /// A directive keyword that is recognised but never executed.
    Unsupported {
        /// Keyword as normalised by the extractor, e.g. `rename-file`.
        keyword: String,
        /// Header argument, if any.
        argument: String,
        /// Source block.
        span: RawSpan,
    },
}

impl Action {
    /// Returns the kind of this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::CreateFile { .. } => ActionKind::CreateFile,
            Self::CreateDirectory { .. } => ActionKind::CreateDirectory,
            Self::ModifyFile { .. } => ActionKind::ModifyFile,
            Self::DeleteFile { .. } => ActionKind::DeleteFile,
            Self::DeleteDirectory { .. } => ActionKind::DeleteDirectory,
            Self::RunCommand { .. } => ActionKind::RunCommand,
            Self::Unsupported { .. } => ActionKind::Unsupported,
        }
    }

    /// Returns the path the action targets, if it targets one.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::CreateFile { path, .. }
            | Self::CreateDirectory { path, .. }
            | Self::ModifyFile { path, .. }
            | Self::DeleteFile { path, .. }
            | Self::DeleteDirectory { path, .. } => Some(path),
            Self::RunCommand { .. } | Self::Unsupported { .. } => None,
        }
    }

    /// Returns the path, command or argument that identifies the action.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::CreateFile { path, .. }
            | Self::CreateDirectory { path, .. }
            | Self::ModifyFile { path, .. }
            | Self::DeleteFile { path, .. }
            | Self::DeleteDirectory { path, .. } => path,
            Self::RunCommand { command, .. } => command,
            Self::Unsupported { argument, .. } => argument,
        }
    }

    /// Returns the source block that produced the action.
    #[must_use]
    pub const fn span(&self) -> &RawSpan {
        match self {
            Self::CreateFile { span, .. }
            | Self::CreateDirectory { span, .. }
            | Self::ModifyFile { span, .. }
            | Self::DeleteFile { span, .. }
            | Self::DeleteDirectory { span, .. }
            | Self::RunCommand { span, .. }
            | Self::Unsupported { span, .. } => span,
        }
    }

    /// Key under which two actions count as duplicates.
    pub(crate) fn dedup_key(&self) -> (ActionKind, &str, &str) {
        match self {
            Self::Unsupported {
                keyword, argument, ..
            } => (ActionKind::Unsupported, keyword, argument),
            other => (other.kind(), other.target(), ""),
        }
    }

    /// Short human-readable label, e.g. `create-file a.txt`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Unsupported {
                keyword, argument, ..
            } => format!("{keyword} {argument}").trim_end().to_owned(),
            other => format!("{} {}", other.kind(), other.target()),
        }
    }
}
