//! Rollout Server
//!
//! Accepts rollout requests over HTTP, runs each one as a detached worker
//! task and reports its outcome through a per-rollout log stream.
//!
//! Architecture:
//! - Configuration: CLI arguments with environment fallbacks
//! - API: `POST /init` and `GET /health`
//! - Services: dispatcher, worker, registry, completion backend, log sinks
//!
//! The outcome of a rollout is never returned to the caller of `/init`.
//! Pollers learn it from the terminal status record that every accepted
//! rollout eventually writes to the log stream.

pub mod api;
pub mod config;
pub mod service;

pub use api::create_router;
pub use config::{RolloutSettings, ServerArgs, ServerConfig};
pub use service::InitDispatcher;
