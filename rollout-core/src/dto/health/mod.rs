//! Health DTOs

use serde::{Deserialize, Serialize};

/// Body returned by `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,

    /// Rollouts whose worker task has not finished yet
    pub active_rollouts: usize,

    /// Whether the server forces every rollout into an error status
    pub force_early_error: bool,
}
