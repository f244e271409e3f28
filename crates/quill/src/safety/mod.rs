//! Command safety checks run before any shell command is spawned.

mod command;
mod denylist;

pub use command::{
    CommandAssessment, CommandRiskAssessor, CommandSafetyChecker, RISK_CONFIDENCE_THRESHOLD,
    RiskAssessment,
};
