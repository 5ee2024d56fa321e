//! Rollout Core
//!
//! Core types for the remote rollout server.
//!
//! This crate contains:
//! - Domain types: rollout status, log records, the validated request model
//! - DTOs: wire shapes exchanged with callers and the tracing collector

pub mod domain;
pub mod dto;
