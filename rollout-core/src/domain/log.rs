//! Log domain types

use serde::{Deserialize, Serialize};

use crate::domain::status::RolloutStatus;

/// A log record emitted by a rollout worker
///
/// Every record carries the id of the rollout it belongs to; the tracing
/// collector groups records by that id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub rollout_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RolloutStatus>,
}

impl LogRecord {
    /// Creates a record stamped with the current time
    pub fn new(rollout_id: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            rollout_id: rollout_id.into(),
            timestamp: chrono::Utc::now(),
            level,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: RolloutStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether this record concludes its rollout
    pub fn is_terminal(&self) -> bool {
        self.status.as_ref().is_some_and(RolloutStatus::is_terminal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}
