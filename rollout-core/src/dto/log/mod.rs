//! Log DTOs for the tracing collector

use serde::{Deserialize, Serialize};

use crate::domain::log::LogRecord;

/// Log batch sent from the server to the tracing collector
///
/// Records keep the order in which they were emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogBatch {
    pub records: Vec<LogRecord>,
}
