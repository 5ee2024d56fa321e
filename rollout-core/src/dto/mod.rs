//! Data Transfer Objects
//!
//! Wire shapes for the `/init` endpoint, the health probe and the log batches
//! posted to the tracing collector.

pub mod health;
pub mod init;
pub mod log;
