//! Shared configuration for the quill pipeline and its host binary.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then a
//! configuration file (`--config-path` or `QUILL_CONFIG_PATH`), then
//! `QUILL_*` environment variables, then command-line flags.

mod defaults;
mod logging;
mod policy;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_ACTION_CACHE_CAPACITY, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_LOG_FILTER,
    DEFAULT_PATH_CACHE_CAPACITY, default_action_cache_capacity, default_allow_commands,
    default_command_timeout_secs, default_log_filter, default_log_filter_string,
    default_log_format, default_path_cache_capacity, default_path_policy,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use policy::PathPolicy;

/// Runtime configuration for directive processing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "QUILL")]
pub struct Config {
    /// Tracing filter expression, as accepted by `EnvFilter`.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Workspace root used when a caller supplies none.
    #[serde(default)]
    pub workspace_root: Option<Utf8PathBuf>,
    /// Permits explicitly absolute paths outside the workspace root.
    #[serde(default)]
    pub allow_absolute_paths: bool,
    /// Whether failed path checks block or merely warn.
    #[serde(default = "default_path_policy")]
    pub path_policy: PathPolicy,
    /// Wall-clock budget for a single shell command, in seconds.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Whether `run-command` directives may spawn processes at all.
    #[serde(default = "default_allow_commands")]
    pub allow_commands: bool,
    /// Number of extraction results retained across calls.
    #[serde(default = "default_action_cache_capacity")]
    pub action_cache_capacity: usize,
    /// Number of normalised paths retained across calls.
    #[serde(default = "default_path_cache_capacity")]
    pub path_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            workspace_root: None,
            allow_absolute_paths: false,
            path_policy: default_path_policy(),
            command_timeout_secs: default_command_timeout_secs(),
            allow_commands: default_allow_commands(),
            action_cache_capacity: default_action_cache_capacity(),
            path_cache_capacity: default_path_cache_capacity(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for log records.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Workspace root used when a caller supplies none.
    #[must_use]
    pub fn workspace_root(&self) -> Option<&camino::Utf8Path> {
        self.workspace_root.as_deref()
    }

    /// Whether explicitly absolute paths may leave the workspace root.
    #[must_use]
    pub const fn allow_absolute_paths(&self) -> bool {
        self.allow_absolute_paths
    }

    /// Policy applied to failed path checks.
    #[must_use]
    pub const fn path_policy(&self) -> PathPolicy {
        self.path_policy
    }

    /// Wall-clock budget for a single shell command.
    #[must_use]
    pub const fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.command_timeout_secs)
    }

    /// Whether shell commands may be spawned.
    #[must_use]
    pub const fn allow_commands(&self) -> bool {
        self.allow_commands
    }

    /// Capacity of the extraction cache, never below one.
    #[must_use]
    pub fn action_cache_capacity(&self) -> usize {
        self.action_cache_capacity.max(1)
    }

    /// Capacity of the path cache, never below one.
    #[must_use]
    pub fn path_cache_capacity(&self) -> usize {
        self.path_cache_capacity.max(1)
    }
}
