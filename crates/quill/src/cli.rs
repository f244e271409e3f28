//! Host entry point used by the `quill` binary.
//!
//! The binary reads directive text from stdin, processes it against the
//! workspace root (configured, else the current directory), and prints the
//! JSON report to stdout. Only bootstrap failures produce a non-zero exit;
//! failed actions are part of a successful report.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use quill_config::Config;
use thiserror::Error;
use tracing::error;

use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::telemetry::{self, TelemetryError};

const CLI_TARGET: &str = "quill::cli";

/// Failures that stop the binary before or after processing.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded from file, environment or flags.
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    /// Telemetry could not be initialised.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// Stdin could not be read as UTF-8 text.
    #[error("failed to read directives from stdin: {0}")]
    ReadInput(#[source] io::Error),
    /// The current directory is unavailable.
    #[error("failed to determine the current directory: {0}")]
    CurrentDirectory(#[source] io::Error),
    /// The current directory is not valid UTF-8.
    #[error("current directory is not valid UTF-8: {}", .0.display())]
    NonUtf8Directory(PathBuf),
    /// The pipeline rejected the workspace root.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// The report could not be serialised.
    #[error("failed to serialise the report: {0}")]
    Serialise(#[source] serde_json::Error),
    /// The report could not be written to stdout.
    #[error("failed to write the report: {0}")]
    WriteReport(#[source] io::Error),
}

/// Runs the binary with explicit streams and returns its exit code.
pub fn run<I, T, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    R: Read,
    W: Write,
    E: Write,
{
    match try_run(args, stdin, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: CLI_TARGET, error = %err, "quill failed");
            let _ = writeln!(stderr, "quill: {err}");
            ExitCode::FAILURE
        }
    }
}

fn try_run<I, T, R, W>(args: I, stdin: &mut R, stdout: &mut W) -> Result<(), CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    R: Read,
    W: Write,
{
    let config = Config::load_from_iter(args).map_err(CliError::LoadConfiguration)?;
    telemetry::initialise(&config)?;

    let mut text = String::new();
    stdin
        .read_to_string(&mut text)
        .map_err(CliError::ReadInput)?;

    let root = match config.workspace_root() {
        Some(root) => root.to_path_buf(),
        None => current_directory()?,
    };

    let pipeline = Pipeline::new(config);
    let report = pipeline.process(&text, Some(root.as_path()))?;

    serde_json::to_writer_pretty(&mut *stdout, &report).map_err(CliError::Serialise)?;
    writeln!(stdout).map_err(CliError::WriteReport)?;
    stdout.flush().map_err(CliError::WriteReport)
}

fn current_directory() -> Result<Utf8PathBuf, CliError> {
    let directory = std::env::current_dir().map_err(CliError::CurrentDirectory)?;
    Utf8PathBuf::from_path_buf(directory).map_err(CliError::NonUtf8Directory)
}
