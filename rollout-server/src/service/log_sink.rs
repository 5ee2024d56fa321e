//! Rollout-scoped logging
//!
//! Workers never touch a sink directly. They log through a [`RolloutLogger`],
//! which stamps every record with its rollout id before handing it to the
//! shared [`LogSink`]. The logger is a plain value, so nothing is registered
//! globally and nothing outlives the worker that owns it.

use rollout_core::domain::log::{LogLevel, LogRecord};
use rollout_core::domain::status::RolloutStatus;
use std::sync::{Arc, Mutex, PoisonError};

/// Destination for rollout log records
///
/// Implementations are shared by every worker and must accept concurrent
/// writers. Emitting never fails from the caller's point of view.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: LogRecord);
}

/// Logging handle bound to one rollout id
#[derive(Clone)]
pub struct RolloutLogger {
    rollout_id: String,
    sink: Arc<dyn LogSink>,
}

impl RolloutLogger {
    pub fn new(rollout_id: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            rollout_id: rollout_id.into(),
            sink,
        }
    }

    pub fn rollout_id(&self) -> &str {
        &self.rollout_id
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message.into(), None);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(LogLevel::Warning, message.into(), None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message.into(), None);
    }

    /// Logs a message carrying a lifecycle status
    pub fn status(&self, level: LogLevel, message: impl Into<String>, status: RolloutStatus) {
        self.emit(level, message.into(), Some(status));
    }

    fn emit(&self, level: LogLevel, message: String, status: Option<RolloutStatus>) {
        self.sink.emit(LogRecord {
            rollout_id: self.rollout_id.clone(),
            timestamp: chrono::Utc::now(),
            level,
            message,
            status,
        });
    }
}

/// Sink that writes records to the process `tracing` output
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn emit(&self, record: LogRecord) {
        let status = record.status.as_ref().map(ToString::to_string);
        let status = status.as_deref();
        match record.level {
            LogLevel::Debug => {
                tracing::debug!(rollout_id = %record.rollout_id, status, "{}", record.message)
            }
            LogLevel::Info => {
                tracing::info!(rollout_id = %record.rollout_id, status, "{}", record.message)
            }
            LogLevel::Warning => {
                tracing::warn!(rollout_id = %record.rollout_id, status, "{}", record.message)
            }
            LogLevel::Error => {
                tracing::error!(rollout_id = %record.rollout_id, status, "{}", record.message)
            }
        }
    }
}

/// Sink that copies every record into each of its children, in order
pub struct FanoutLogSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutLogSink {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self { sinks }
    }
}

impl LogSink for FanoutLogSink {
    fn emit(&self, record: LogRecord) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(record.clone());
            }
            last.emit(record);
        }
    }
}

/// Append-only in-memory sink
///
/// Keeps every record for the life of the process. Used by tests and for
/// local debugging without a collector.
#[derive(Clone, Default)]
pub struct InMemoryLogSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl InMemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, in emission order
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records of one rollout, in emission order
    pub fn records_for(&self, rollout_id: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.rollout_id == rollout_id)
            .cloned()
            .collect()
    }

    /// Every terminal status recorded for a rollout
    pub fn terminal_statuses(&self, rollout_id: &str) -> Vec<RolloutStatus> {
        self.records_for(rollout_id)
            .into_iter()
            .filter_map(|record| record.status)
            .filter(RolloutStatus::is_terminal)
            .collect()
    }

    /// The terminal status of a rollout, or `None` while it is still running
    pub fn terminal_status(&self, rollout_id: &str) -> Option<RolloutStatus> {
        self.terminal_statuses(rollout_id).into_iter().next()
    }
}

impl LogSink for InMemoryLogSink {
    fn emit(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}
