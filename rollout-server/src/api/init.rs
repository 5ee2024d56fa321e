//! Init API Handler

use axum::{Json, extract::State, http::StatusCode};
use rollout_core::dto::init::InitRequest;

use crate::api::error::ApiResult;
use crate::service::InitDispatcher;

/// POST /init
/// Accept a rollout and start it in the background
///
/// Responds as soon as the worker is spawned. A request that fails
/// validation is rejected with 400 and starts nothing.
pub async fn init_rollout(
    State(dispatcher): State<InitDispatcher>,
    Json(req): Json<InitRequest>,
) -> ApiResult<StatusCode> {
    let rollout_id = req.metadata.rollout_id.clone();
    tracing::debug!("Init request for rollout: {}", rollout_id);

    dispatcher.init(req).inspect_err(|e| {
        tracing::warn!("Rejected rollout {}: {}", rollout_id, e);
    })?;

    Ok(StatusCode::OK)
}
