//! Rollout worker
//!
//! Runs one chat completion on behalf of an accepted request. Whatever
//! happens during the call, the worker ends by emitting exactly one terminal
//! status record: pollers treat a rollout without one as still running.

use futures::FutureExt;
use rollout_core::domain::log::LogLevel;
use rollout_core::domain::request::RolloutRequest;
use rollout_core::domain::status::RolloutStatus;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::config::RolloutSettings;
use crate::service::completion::{CompletionBackend, CompletionError, CompletionTarget};
use crate::service::log_sink::RolloutLogger;

/// A single rollout, ready to run on its own task
pub struct RolloutWorker {
    request: RolloutRequest,
    logger: RolloutLogger,
    settings: Arc<RolloutSettings>,
    backend: Arc<dyn CompletionBackend>,
}

impl RolloutWorker {
    pub fn new(
        request: RolloutRequest,
        logger: RolloutLogger,
        settings: Arc<RolloutSettings>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            request,
            logger,
            settings,
            backend,
        }
    }

    /// Runs the rollout to completion
    ///
    /// Never fails and never panics outward. Call-time errors, including a
    /// panic inside the completion call, are logged and swallowed.
    pub async fn run(self) {
        let rollout_id = self.logger.rollout_id().to_string();

        self.logger.status(
            LogLevel::Info,
            format!("Rollout {} started", rollout_id),
            RolloutStatus::running(),
        );

        let outcome = AssertUnwindSafe(self.complete())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(CompletionError::Panicked(panic_message(panic.as_ref()))));

        if let Err(e) = outcome {
            // The rollout is still reported as finished below so pollers are unblocked
            self.logger
                .error(format!("Error in rollout {}: {}", rollout_id, e));
        }

        self.finish(&rollout_id);
    }

    async fn complete(&self) -> Result<(), CompletionError> {
        let kwargs = self.request.completion_kwargs()?;
        self.logger.info(format!(
            "Final completion kwargs: {}",
            serde_json::to_string(&kwargs)?
        ));

        let target = CompletionTarget {
            base_url: self
                .request
                .model_base_url
                .clone()
                .unwrap_or_else(|| self.settings.default_model_base_url.clone()),
            api_key: self.settings.api_key(),
        };

        self.logger.info(format!(
            "Sending completion request to model {}",
            self.request.model()
        ));

        let completion = self.backend.create(&target, &kwargs).await?;
        self.logger.info(format!("Completed response: {}", completion));

        Ok(())
    }

    /// Emits the single terminal status of this rollout
    fn finish(&self, rollout_id: &str) {
        match &self.settings.force_early_error {
            Some(message) => self.logger.status(
                LogLevel::Error,
                message.clone(),
                RolloutStatus::rollout_error(message.clone()),
            ),
            None => self.logger.status(
                LogLevel::Info,
                format!("Rollout {} completed", rollout_id),
                RolloutStatus::finished(),
            ),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
