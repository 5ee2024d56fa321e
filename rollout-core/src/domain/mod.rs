//! Core domain types
//!
//! These types are shared between the server (which produces them) and the
//! client crate (which ships them to the tracing collector).

pub mod log;
pub mod request;
pub mod status;
