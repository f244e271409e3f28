//! Directive extraction and sandboxed workspace mutation.
//!
//! `quill` sits between a language model and a real filesystem. It scans
//! free-form model output for fenced directive blocks such as
//! `` ```create-file: src/app.js ``, checks every path against the workspace
//! root, orders file creation so imported files exist before their
//! importers, applies the mutations, and reports what happened.
//!
//! # Core Types
//!
//! - [`Pipeline`] - Built once by the host; runs extraction, ordering,
//!   validation and execution for each input
//! - [`ActionExtractor`] - Parses text into [`Action`]s
//! - [`ActionExecutor`] - Applies actions through a [`FileSystem`]
//! - [`Report`] - Counts, per-action [`ExecutionOutcome`]s and the input text
//!   with each directive replaced by its status
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use quill::Pipeline;
//! use quill_config::Config;
//!
//! let pipeline = Pipeline::new(Config::default());
//! let report = pipeline
//!     .process("```create-file: hello.txt\nhello\n```\n", Some(Utf8Path::new("/tmp/ws")))
//!     .expect("workspace root supplied");
//! assert_eq!(report.total_actions, 1);
//! ```

pub mod action;
pub mod cache;
pub mod cli;
pub mod error;
pub mod executor;
pub mod extract;
pub mod fs;
pub mod imports;
pub mod paths;
pub mod pipeline;
pub mod safety;
pub mod telemetry;

pub use action::{Action, ActionKind, RawSpan};
pub use cache::{CacheStats, PipelineCacheStats};
pub use error::{ActionError, ErrorKind, PipelineError};
pub use executor::{
    ActionExecutor, CommandOutput, CommandRunner, CommandStatus, ExecutionOutcome,
    ExecutionSettings, Report, ShellCommandRunner,
};
pub use extract::{ActionExtractor, ExtensionPredicate, is_extension_only};
pub use fs::{EntryKind, EntryStat, FileSystem, OsFileSystem};
#[cfg(any(test, feature = "test-support"))]
pub use fs::MemoryFileSystem;
pub use imports::{ImportExtractor, TreeSitterImportExtractor};
pub use paths::{NormalizedPath, PathViolation, normalize, validate};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use safety::{CommandAssessment, CommandRiskAssessor, CommandSafetyChecker, RiskAssessment};

#[cfg(test)]
mod tests;
