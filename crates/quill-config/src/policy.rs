use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How a failed path security check affects the write it guards.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PathPolicy {
    /// Refuse the write and record a security violation.
    #[default]
    Block,
    /// Log the violation and continue when the directive spelled the path
    /// as absolute. Relative paths that escape the workspace are refused
    /// either way.
    Warn,
}

impl PathPolicy {
    /// Returns whether violations abort the guarded write.
    #[must_use]
    pub const fn blocks(self) -> bool {
        matches!(self, Self::Block)
    }
}
