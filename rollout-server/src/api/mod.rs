//! API Module
//!
//! HTTP API layer for the rollout server.

pub mod error;
pub mod health;
pub mod init;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::service::InitDispatcher;

/// Create the main API router with all endpoints
pub fn create_router(dispatcher: InitDispatcher) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/init", post(init::init_rollout))
        .with_state(dispatcher)
        .layer(TraceLayer::new_for_http())
}
