//! Command safety verdicts combining the denylist with an optional risk assessor.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::denylist;

const SAFETY_TARGET: &str = "quill::safety";

/// Confidence an external assessment must exceed before it blocks a command.
pub const RISK_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Verdict reported by an external risk assessor.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Whether the assessor considers the command dangerous.
    pub dangerous: bool,
    /// Confidence in the verdict, from 0.0 to 1.0.
    pub confidence: f64,
    /// Human-readable explanation.
    pub reason: String,
}

/// Optional capability that scores commands the denylist lets through.
///
/// Returning `None` means no assessment was available; the command is then
/// allowed.
pub trait CommandRiskAssessor: Send + Sync {
    /// Scores `command`.
    fn assess(&self, command: &str) -> Option<RiskAssessment>;
}

/// Outcome of [`CommandSafetyChecker::assess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAssessment {
    /// Whether the command must not run.
    pub dangerous: bool,
    /// Why the command was blocked, or why it was allowed.
    pub reason: String,
}

impl CommandAssessment {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            dangerous: false,
            reason: reason.into(),
        }
    }

    fn block(reason: impl Into<String>) -> Self {
        Self {
            dangerous: true,
            reason: reason.into(),
        }
    }
}

/// Gatekeeper for `run-command` directives.
///
/// The built-in denylist always applies. A pluggable assessor may flag
/// further commands, but blocks only when it is confident.
#[derive(Clone, Default)]
pub struct CommandSafetyChecker {
    assessor: Option<Arc<dyn CommandRiskAssessor>>,
}

impl fmt::Debug for CommandSafetyChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSafetyChecker")
            .field("assessor", &self.assessor.is_some())
            .finish()
    }
}

impl CommandSafetyChecker {
    /// Creates a checker that relies on the denylist alone.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a checker that also consults `assessor`.
    #[must_use]
    pub fn with_assessor(assessor: Arc<dyn CommandRiskAssessor>) -> Self {
        Self {
            assessor: Some(assessor),
        }
    }

    /// Decides whether `command` may run.
    #[must_use]
    pub fn assess(&self, command: &str) -> CommandAssessment {
        if let Some(reason) = denylist::match_command(command) {
            warn!(target: SAFETY_TARGET, command, reason, "command matched denylist");
            return CommandAssessment::block(reason);
        }

        let Some(assessor) = &self.assessor else {
            return CommandAssessment::allow("no denylist match");
        };
        match assessor.assess(command) {
            Some(verdict) if verdict.dangerous && verdict.confidence > RISK_CONFIDENCE_THRESHOLD => {
                warn!(
                    target: SAFETY_TARGET,
                    command,
                    confidence = verdict.confidence,
                    reason = %verdict.reason,
                    "risk assessor blocked command"
                );
                CommandAssessment::block(verdict.reason)
            }
            Some(verdict) => {
                debug!(
                    target: SAFETY_TARGET,
                    command,
                    dangerous = verdict.dangerous,
                    confidence = verdict.confidence,
                    "risk assessment below blocking threshold"
                );
                CommandAssessment::allow(verdict.reason)
            }
            None => {
                debug!(target: SAFETY_TARGET, command, "risk assessor unavailable");
                CommandAssessment::allow("risk assessment unavailable")
            }
        }
    }
}
