//! Rollout status domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status attached to a log record
///
/// `Running` is informational. `Finished` and `Error` are terminal: every
/// accepted rollout produces exactly one of them. A rollout with no terminal
/// record yet is still considered running by pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RolloutStatus {
    Running,
    Finished,
    Error { message: String },
}

impl RolloutStatus {
    pub fn running() -> Self {
        Self::Running
    }

    pub fn finished() -> Self {
        Self::Finished
    }

    pub fn rollout_error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this status concludes the rollout
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Error { .. })
    }
}

impl fmt::Display for RolloutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
            Self::Error { message } => write!(f, "error: {}", message),
        }
    }
}
