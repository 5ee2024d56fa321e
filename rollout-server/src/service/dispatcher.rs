//! Init dispatcher
//!
//! Entry point for new rollouts: validate, bind a scoped logger, spawn the
//! worker, return. The caller never waits for the completion call.

use rollout_core::domain::request::{RolloutRequest, ValidationError};
use rollout_core::dto::init::InitRequest;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::RolloutSettings;
use crate::service::completion::CompletionBackend;
use crate::service::log_sink::{LogSink, RolloutLogger};
use crate::service::registry::RolloutRegistry;
use crate::service::worker::RolloutWorker;

#[derive(Clone)]
pub struct InitDispatcher {
    settings: Arc<RolloutSettings>,
    backend: Arc<dyn CompletionBackend>,
    sink: Arc<dyn LogSink>,
    registry: RolloutRegistry,
}

impl InitDispatcher {
    pub fn new(
        settings: RolloutSettings,
        backend: Arc<dyn CompletionBackend>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            backend,
            sink,
            registry: RolloutRegistry::new(),
        }
    }

    /// Accepts a rollout and starts its worker
    ///
    /// Validation runs synchronously; a rejected request never spawns a
    /// worker and never produces a log record. On success the worker is
    /// spawned on the current tokio runtime and this returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(&self, raw: InitRequest) -> Result<(), ValidationError> {
        let request = RolloutRequest::validate(raw)?;
        let rollout_id = request.rollout_id.clone();

        let worker = RolloutWorker::new(
            request,
            self.scoped_logger(&rollout_id),
            Arc::clone(&self.settings),
            Arc::clone(&self.backend),
        );

        let handle = tokio::spawn(worker.run());
        self.registry.track(rollout_id.clone(), handle);

        info!("Rollout {} accepted", rollout_id);
        debug!("{} rollout(s) in flight", self.registry.active_count());

        Ok(())
    }

    /// Logger whose records all carry `rollout_id`
    pub fn scoped_logger(&self, rollout_id: &str) -> RolloutLogger {
        RolloutLogger::new(rollout_id, Arc::clone(&self.sink))
    }

    pub fn registry(&self) -> &RolloutRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &RolloutSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::log_sink::InMemoryLogSink;
    use crate::service::test_support::{Script, ScriptedBackend};
    use rollout_core::domain::status::RolloutStatus;
    use rollout_core::dto::init::{Message, RolloutMetadata};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn raw(rollout_id: &str, messages: Vec<Message>, params: serde_json::Value) -> InitRequest {
        InitRequest {
            metadata: RolloutMetadata::new(rollout_id),
            messages: Some(messages),
            completion_params: params.as_object().cloned().unwrap(),
            tools: None,
            model_base_url: None,
        }
    }

    fn dispatcher(script: Script, settings: RolloutSettings) -> (InitDispatcher, InMemoryLogSink) {
        let sink = InMemoryLogSink::new();
        let dispatcher = InitDispatcher::new(
            settings,
            Arc::new(ScriptedBackend::new(script)),
            Arc::new(sink.clone()),
        );
        (dispatcher, sink)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_init_returns_before_completion() {
        let gate = Arc::new(Notify::new());
        let (dispatcher, sink) =
            dispatcher(Script::WaitFor(gate.clone()), RolloutSettings::default());

        dispatcher
            .init(raw("r-1", vec![Message::user("hi")], json!({ "model": "m" })))
            .unwrap();

        // Let the worker reach the backend, which stays blocked on the gate
        tokio::time::timeout(Duration::from_secs(5), async {
            while !sink
                .records_for("r-1")
                .iter()
                .any(|r| r.message == "Sending completion request to model m")
            {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(dispatcher.registry().is_active("r-1"));
        assert_eq!(sink.terminal_status("r-1"), None);

        gate.notify_one();
        dispatcher.registry().drain().await;

        assert_eq!(sink.terminal_statuses("r-1"), vec![RolloutStatus::finished()]);
    }

    #[tokio::test]
    async fn test_empty_messages_rejected_without_logs() {
        let (dispatcher, sink) =
            dispatcher(Script::Respond(json!({})), RolloutSettings::default());

        let err = dispatcher
            .init(raw("r-2", vec![], json!({ "model": "m" })))
            .unwrap_err();

        assert_eq!(err, ValidationError::MissingMessages);
        assert_eq!(dispatcher.registry().drain().await, 0);
        assert!(sink.records_for("r-2").is_empty());
    }

    #[tokio::test]
    async fn test_missing_model_rejected_without_logs() {
        let (dispatcher, sink) =
            dispatcher(Script::Respond(json!({})), RolloutSettings::default());

        let err = dispatcher
            .init(raw("r-3", vec![Message::user("hi")], json!({ "temperature": 1 })))
            .unwrap_err();

        assert_eq!(err, ValidationError::MissingModel);
        assert_eq!(dispatcher.registry().active_count(), 0);
        assert!(sink.records().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_rollout_gets_exactly_one_terminal_status() {
        let (dispatcher, sink) = dispatcher(
            Script::Fail(500, "flaky provider"),
            RolloutSettings::default(),
        );

        for i in 0..25 {
            dispatcher
                .init(raw(
                    &format!("r-{}", i),
                    vec![Message::user("hi")],
                    json!({ "model": "m" }),
                ))
                .unwrap();
        }

        assert_eq!(dispatcher.registry().drain().await, 25);

        for i in 0..25 {
            let rollout_id = format!("r-{}", i);
            assert_eq!(
                sink.terminal_statuses(&rollout_id),
                vec![RolloutStatus::finished()]
            );
            assert!(sink.records_for(&rollout_id).last().unwrap().is_terminal());
        }
    }

    #[tokio::test]
    async fn test_override_applies_to_every_rollout() {
        let (dispatcher, sink) = dispatcher(
            Script::Respond(json!({})),
            RolloutSettings::default().with_force_early_error("boom"),
        );

        for id in ["a", "b", "c"] {
            dispatcher
                .init(raw(id, vec![Message::user("hi")], json!({ "model": "m" })))
                .unwrap();
        }
        dispatcher.registry().drain().await;

        for id in ["a", "b", "c"] {
            assert_eq!(
                sink.terminal_statuses(id),
                vec![RolloutStatus::rollout_error("boom")]
            );
        }
    }

    #[tokio::test]
    async fn test_stuck_rollout_does_not_block_bounded_drain() {
        let gate = Arc::new(Notify::new());
        let (dispatcher, sink) =
            dispatcher(Script::WaitFor(gate.clone()), RolloutSettings::default());

        dispatcher
            .init(raw("r-1", vec![Message::user("hi")], json!({ "model": "m" })))
            .unwrap();

        let result = dispatcher
            .registry()
            .drain_within(Duration::from_millis(50))
            .await;

        assert_eq!(result, Err(0));
        assert_eq!(dispatcher.registry().active_ids(), vec!["r-1".to_string()]);
        assert_eq!(sink.terminal_status("r-1"), None);

        assert_eq!(dispatcher.registry().abort_all(), 1);
        assert_eq!(dispatcher.registry().active_count(), 0);
    }

    #[test]
    fn test_scoped_logger_binds_rollout_id() {
        let (dispatcher, sink) =
            dispatcher(Script::Respond(json!({})), RolloutSettings::default());

        dispatcher.scoped_logger("x").info("hello");

        assert_eq!(sink.records_for("x").len(), 1);
        assert_eq!(dispatcher.settings().force_early_error, None);
    }
}
