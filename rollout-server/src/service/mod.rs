//! Service layer
//!
//! The rollout core: dispatcher, worker, registry and the log sinks the
//! workers write to. The completion backend and the sinks are trait-based
//! so tests can substitute them.

mod completion;
mod dispatcher;
mod forwarder;
mod log_sink;
mod registry;
mod worker;

#[cfg(test)]
mod test_support;

// Re-export traits
pub use completion::CompletionBackend;
pub use log_sink::LogSink;

// Re-export implementations
pub use completion::{CompletionError, CompletionTarget, OpenAiCompatibleBackend};
pub use dispatcher::InitDispatcher;
pub use forwarder::{CollectorLogSink, LogForwarder};
pub use log_sink::{FanoutLogSink, InMemoryLogSink, RolloutLogger, TracingLogSink};
pub use registry::RolloutRegistry;
pub use worker::RolloutWorker;
