//! Health Check API Handler

use axum::{Json, extract::State};
use rollout_core::dto::health::HealthResponse;

use crate::service::InitDispatcher;

/// GET /health
/// Reports liveness and the number of rollouts still running
pub async fn health_check(State(dispatcher): State<InitDispatcher>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_rollouts: dispatcher.registry().active_count(),
        force_early_error: dispatcher.settings().force_early_error.is_some(),
    })
}
