use crate::logging::LogFormat;
use crate::policy::PathPolicy;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default wall-clock budget for a single shell command, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Default number of extraction results kept in the action cache.
pub const DEFAULT_ACTION_CACHE_CAPACITY: usize = 256;

/// Default number of normalised paths kept in the path cache.
pub const DEFAULT_PATH_CACHE_CAPACITY: usize = 4096;

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default path policy.
pub fn default_path_policy() -> PathPolicy {
    PathPolicy::Block
}

/// Default command timeout in seconds.
pub fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

/// Commands run unless explicitly disabled.
pub fn default_allow_commands() -> bool {
    true
}

/// Default action cache capacity.
pub fn default_action_cache_capacity() -> usize {
    DEFAULT_ACTION_CACHE_CAPACITY
}

/// Default path cache capacity.
pub fn default_path_cache_capacity() -> usize {
    DEFAULT_PATH_CACHE_CAPACITY
}
