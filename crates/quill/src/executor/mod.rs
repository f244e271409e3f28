//! Executes extracted actions against a workspace.
//!
//! Every action yields exactly one [`ExecutionOutcome`]; a failure is
//! recorded and execution moves on. Paths are normalised and security
//! checked before every mutation, and commands pass the safety checker
//! before anything is spawned.

mod order;
mod report;
mod runner;

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use quill_config::{Config, PathPolicy};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::cache::PathCache;
use crate::error::{ActionError, ErrorKind};
use crate::fs::{EntryKind, FileSystem};
use crate::imports::ImportExtractor;
use crate::paths::{self, NormalizedPath, PathViolation};
use crate::safety::CommandSafetyChecker;

pub use report::{ExecutionOutcome, Report};
pub use runner::{CommandOutput, CommandRunner, CommandStatus, ShellCommandRunner};

use report::output_tail;

const EXECUTE_TARGET: &str = "quill::execute";

/// Knobs that shape execution, usually taken from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSettings {
    /// Accept absolute paths outside the workspace.
    pub allow_absolute_paths: bool,
    /// Whether path violations abort the guarded operation.
    pub path_policy: PathPolicy,
    /// Run `run-command` directives at all.
    pub allow_commands: bool,
    /// Wall-clock budget per command.
    pub command_timeout: Duration,
}

impl ExecutionSettings {
    /// Extracts the execution settings from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            allow_absolute_paths: config.allow_absolute_paths(),
            path_policy: config.path_policy(),
            allow_commands: config.allow_commands(),
            command_timeout: config.command_timeout(),
        }
    }
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of an action that achieved its effect.
struct Completed {
    message: String,
    annotation: Option<ErrorKind>,
    output: Option<String>,
}

impl Completed {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            annotation: None,
            output: None,
        }
    }
}

/// What a resolved path is about to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Write,
    Delete,
}

/// Runs one batch of actions against a workspace root.
pub struct ActionExecutor<'a> {
    root: &'a Utf8Path,
    file_system: &'a dyn FileSystem,
    runner: &'a dyn CommandRunner,
    safety: &'a CommandSafetyChecker,
    imports: Option<&'a dyn ImportExtractor>,
    path_cache: Option<&'a PathCache>,
    settings: ExecutionSettings,
}

impl<'a> ActionExecutor<'a> {
    /// Creates an executor for `root`.
    #[must_use]
    pub fn new(
        root: &'a Utf8Path,
        file_system: &'a dyn FileSystem,
        runner: &'a dyn CommandRunner,
        safety: &'a CommandSafetyChecker,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            root,
            file_system,
            runner,
            safety,
            imports: None,
            path_cache: None,
            settings,
        }
    }

    /// Orders file creations by the imports `extractor` reports.
    #[must_use]
    pub fn with_import_extractor(mut self, extractor: &'a dyn ImportExtractor) -> Self {
        self.imports = Some(extractor);
        self
    }

    /// Memoises path normalisation in `cache`.
    #[must_use]
    pub fn with_path_cache(mut self, cache: &'a PathCache) -> Self {
        self.path_cache = Some(cache);
        self
    }

    /// Executes `actions` and returns one outcome per action, in execution
    /// order.
    #[must_use]
    pub fn execute(&self, actions: &[Action]) -> Vec<ExecutionOutcome> {
        let resolve = |raw: &str| self.normalize(raw).into_path();
        let order = order::execution_order(actions, self.imports, &resolve);

        order
            .into_iter()
            .filter_map(|index| actions.get(index).map(|action| (index, action)))
            .map(|(index, action)| self.execute_one(index, action))
            .collect()
    }

    fn execute_one(&self, index: usize, action: &Action) -> ExecutionOutcome {
        let result = match action {
            Action::CreateFile { path, content, .. } => self.create_file(path, content),
            Action::CreateDirectory { path, .. } => self.create_directory(path),
            Action::ModifyFile { path, content, .. } => self.modify_file(path, content),
            Action::DeleteFile { path, .. } => self.delete_file(path),
            Action::DeleteDirectory { path, .. } => self.delete_directory(path),
            Action::RunCommand { command, .. } => self.run_command(command),
            Action::Unsupported { keyword, .. } => {
                debug!(target: EXECUTE_TARGET, keyword, "skipping unsupported directive");
                return ExecutionOutcome::skipped(
                    index,
                    action,
                    format!("{keyword} is recognised but not supported"),
                );
            }
        };

        match result {
            Ok(completed) => {
                info!(
                    target: EXECUTE_TARGET,
                    action = %action.describe(),
                    "action succeeded"
                );
                let outcome = ExecutionOutcome::succeeded(index, action, completed.message)
                    .with_output(completed.output);
                match completed.annotation {
                    Some(kind) => outcome.annotated(kind),
                    None => outcome,
                }
            }
            Err(error) => {
                warn!(
                    target: EXECUTE_TARGET,
                    action = %action.describe(),
                    kind = %error.kind(),
                    error = %error,
                    "action failed"
                );
                ExecutionOutcome::failed(index, action, error.kind(), error.to_string())
                    .with_output(error.output().map(str::to_owned))
            }
        }
    }

    fn normalize(&self, raw: &str) -> NormalizedPath {
        let Some(cache) = self.path_cache else {
            return paths::normalize(raw, self.root);
        };
        let key = (raw.to_owned(), self.root.to_path_buf());
        if let Some(hit) = cache.get(&key) {
            return hit;
        }
        let normalized = paths::normalize(raw, self.root);
        cache.insert(key, normalized.clone());
        normalized
    }

    /// Normalises `raw` and applies the security check and path policy.
    fn resolve(&self, raw: &str, access: Access) -> Result<Utf8PathBuf, ActionError> {
        let normalized = self.normalize(raw);
        if let Err(violation) = paths::check(raw, &normalized, self.settings.allow_absolute_paths)
        {
            let malformed = matches!(
                violation,
                PathViolation::Empty | PathViolation::InvalidCharacter { .. }
            );
            if malformed || self.settings.path_policy.blocks() || !normalized.explicit_absolute() {
                return Err(violation.into());
            }
            warn!(
                target: EXECUTE_TARGET,
                path = raw,
                violation = %violation,
                "path violation tolerated by policy"
            );
        }

        let path = normalized.into_path();
        if access == Access::Delete && paths::normalize(".", self.root).path() == path {
            return Err(ActionError::conflict(
                path,
                "refusing to delete the workspace root",
            ));
        }
        Ok(path)
    }

    fn display<'p>(&self, path: &'p Utf8Path) -> &'p str {
        match path.strip_prefix(self.root) {
            Ok(relative) if !relative.as_str().is_empty() => relative.as_str(),
            _ => path.as_str(),
        }
    }

    /// Creates the missing parents of `path`, refusing to pass through files.
    fn ensure_parent(&self, path: &Utf8Path) -> Result<(), ActionError> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        if let Some(blocker) = parent
            .ancestors()
            .find(|ancestor| self.file_system.exists(ancestor))
            .filter(|ancestor| self.file_system.is_file(ancestor))
        {
            return Err(ActionError::conflict(
                blocker,
                "parent path exists as a regular file",
            ));
        }
        self.file_system
            .create_dir_all(parent)
            .map_err(|err| ActionError::io("create directory", parent, err))
    }

    fn create_file(&self, raw: &str, content: &str) -> Result<Completed, ActionError> {
        let path = self.resolve(raw, Access::Write)?;
        if self.file_system.is_dir(&path) {
            return Err(ActionError::conflict(path, "a directory already exists at"));
        }
        self.ensure_parent(&path)?;
        self.file_system
            .write_file(&path, content)
            .map_err(|err| ActionError::io("write", &path, err))?;
        if !self.file_system.is_file(&path) {
            return Err(ActionError::conflict(path, "file missing after write"));
        }
        Ok(Completed::new(format!("created {}", self.display(&path))))
    }

    fn create_directory(&self, raw: &str) -> Result<Completed, ActionError> {
        let path = self.resolve(raw, Access::Write)?;
        if self.file_system.is_file(&path) {
            return Err(ActionError::conflict(path, "a regular file already exists at"));
        }
        self.ensure_parent(&path)?;
        self.file_system
            .create_dir_all(&path)
            .map_err(|err| ActionError::io("create directory", &path, err))?;
        match self.file_system.stat(&path) {
            Ok(stat) if stat.kind == EntryKind::Directory => Ok(Completed::new(format!(
                "created directory {}",
                self.display(&path)
            ))),
            _ => Err(ActionError::conflict(path, "directory missing after create")),
        }
    }

    fn modify_file(&self, raw: &str, content: &str) -> Result<Completed, ActionError> {
        let path = self.resolve(raw, Access::Write)?;
        if self.file_system.is_dir(&path) {
            return Err(ActionError::conflict(path, "a directory already exists at"));
        }

        if !self.file_system.exists(&path) {
            self.ensure_parent(&path)?;
            self.file_system
                .write_file(&path, content)
                .map_err(|err| ActionError::io("write", &path, err))?;
            return Ok(Completed::new(format!(
                "created {} (file did not exist)",
                self.display(&path)
            )));
        }

        let previous = self
            .file_system
            .read_to_string(&path)
            .map_err(|err| ActionError::io("read", &path, err))?;
        let backup = backup_path(&path);
        self.file_system
            .write_file(&backup, &previous)
            .map_err(|err| ActionError::io("back up", &backup, err))?;

        if let Err(err) = self.file_system.write_file(&path, content) {
            if let Err(restore) = self.file_system.write_file(&path, &previous) {
                warn!(
                    target: EXECUTE_TARGET,
                    path = %path,
                    error = %restore,
                    "failed to restore file from backup"
                );
            }
            return Err(ActionError::io("write", &path, err));
        }
        Ok(Completed::new(format!(
            "modified {} (backup at {})",
            self.display(&path),
            self.display(&backup)
        )))
    }

    fn delete_file(&self, raw: &str) -> Result<Completed, ActionError> {
        let path = self.resolve(raw, Access::Delete)?;
        if self.file_system.is_dir(&path) {
            return Err(ActionError::conflict(path, "path is a directory"));
        }
        if !self.file_system.exists(&path) {
            return Err(ActionError::conflict(path, "file does not exist"));
        }
        self.file_system
            .remove_file(&path)
            .map_err(|err| ActionError::io("delete", &path, err))?;
        Ok(Completed::new(format!("deleted {}", self.display(&path))))
    }

    fn delete_directory(&self, raw: &str) -> Result<Completed, ActionError> {
        let path = self.resolve(raw, Access::Delete)?;
        if self.file_system.is_file(&path) {
            return Err(ActionError::conflict(path, "path is a regular file"));
        }
        if !self.file_system.exists(&path) {
            return Err(ActionError::conflict(path, "directory does not exist"));
        }
        self.file_system
            .remove_dir_all(&path)
            .map_err(|err| ActionError::io("delete directory", &path, err))?;
        Ok(Completed::new(format!(
            "deleted directory {}",
            self.display(&path)
        )))
    }

    fn run_command(&self, command: &str) -> Result<Completed, ActionError> {
        if !self.settings.allow_commands {
            return Err(ActionError::CommandDisabled);
        }
        let assessment = self.safety.assess(command);
        if assessment.dangerous {
            return Err(ActionError::CommandRefused {
                reason: assessment.reason,
            });
        }

        let label = command.lines().next().unwrap_or_default().trim();
        let output = self
            .runner
            .run(command, self.root, self.settings.command_timeout)
            .map_err(|err| ActionError::Spawn {
                source: Arc::new(err),
            })?;
        let tail = output_tail(&output.stdout, &output.stderr);

        match output.status {
            CommandStatus::TimedOut => Ok(Completed {
                message: format!(
                    "`{label}` still running after {}s; the process was stopped",
                    self.settings.command_timeout.as_secs()
                ),
                annotation: Some(ErrorKind::Timeout),
                output: tail,
            }),
            status if status.success() => Ok(Completed {
                message: format!("ran `{label}`"),
                annotation: None,
                output: tail,
            }),
            CommandStatus::Exited(code) => Err(ActionError::CommandFailed {
                status: code.map_or_else(
                    || "a signal".to_owned(),
                    |code| format!("status {code}"),
                ),
                output: tail.unwrap_or_default(),
            }),
        }
    }
}

fn backup_path(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}.bak"))
}

#[cfg(test)]
mod tests;
