//! Error types for the directive pipeline.
//!
//! Only programmer misuse surfaces as [`PipelineError`]. Failures of a single
//! directive are recorded as outcomes carrying an [`ErrorKind`] so that one
//! bad action never aborts the rest of the batch.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use serde::Serialize;
use strum::Display;
use thiserror::Error;

use crate::paths::PathViolation;

/// Classification attached to a failed or annotated outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The target path failed the workspace security check.
    PathSecurityViolation,
    /// The filesystem is in a state that conflicts with the directive.
    FilesystemConflict,
    /// An I/O operation failed.
    Io,
    /// The command was refused by the safety checker.
    DangerousCommand,
    /// Command execution is turned off in the configuration.
    CommandDisabled,
    /// The command ran and exited unsuccessfully.
    CommandFailed,
    /// The directive is recognised but never executed.
    UnknownActionKind,
    /// The command outlived its time budget and was killed.
    Timeout,
}

/// Errors returned by [`Pipeline::process`](crate::Pipeline::process).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Neither the caller nor the configuration supplied a workspace root.
    #[error("no workspace root was supplied and none is configured")]
    MissingWorkspaceRoot,
    /// The supplied workspace root cannot anchor relative paths.
    #[error("workspace root {path} is invalid: {reason}")]
    InvalidWorkspaceRoot {
        /// Root as supplied.
        path: Utf8PathBuf,
        /// Why the root was rejected.
        reason: String,
    },
}

impl PipelineError {
    /// Creates an invalid workspace root error.
    #[must_use]
    pub fn invalid_root(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidWorkspaceRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single directive.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// The path was rejected by the security validator.
    #[error("path rejected: {0}")]
    Security(#[from] PathViolation),
    /// The filesystem state conflicts with the directive.
    #[error("{message}: {path}")]
    Conflict {
        /// Path involved in the conflict.
        path: Utf8PathBuf,
        /// Description of the conflict.
        message: String,
    },
    /// An I/O operation failed.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// Operation that failed, e.g. `write`.
        operation: &'static str,
        /// Path involved in the operation.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Command execution is turned off in the configuration.
    #[error("command execution is disabled by configuration")]
    CommandDisabled,
    /// The command was refused before it was spawned.
    #[error("command refused: {reason}")]
    CommandRefused {
        /// Why the command was refused.
        reason: String,
    },
    /// The command ran and failed.
    #[error("command exited with {status}")]
    CommandFailed {
        /// Exit status description.
        status: String,
        /// Tail of the captured output.
        output: String,
    },
    /// The command could not be spawned or waited on.
    #[error("command could not run: {source}")]
    Spawn {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl ActionError {
    /// Creates a filesystem conflict error.
    #[must_use]
    pub fn conflict(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self::Conflict {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an I/O error for `operation` on `path`.
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Returns the outcome classification for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Security(_) => ErrorKind::PathSecurityViolation,
            Self::Conflict { .. } => ErrorKind::FilesystemConflict,
            Self::Io { .. } | Self::Spawn { .. } => ErrorKind::Io,
            Self::CommandRefused { .. } => ErrorKind::DangerousCommand,
            Self::CommandDisabled => ErrorKind::CommandDisabled,
            Self::CommandFailed { .. } => ErrorKind::CommandFailed,
        }
    }

    /// Captured command output, when the error carries any.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}
