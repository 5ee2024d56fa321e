//! Rollout server endpoints

use rollout_core::dto::health::HealthResponse;
use rollout_core::dto::init::InitRequest;

use crate::error::Result;
use crate::{RolloutClient, handle_empty_response, handle_response};

impl RolloutClient {
    /// Initiate a rollout
    ///
    /// Returns as soon as the server has accepted the request. The outcome of
    /// the rollout is only observable through the tracing collector.
    ///
    /// # Errors
    /// A 4xx [`ClientError::ApiError`](crate::ClientError::ApiError) means the
    /// request failed validation and no rollout was started.
    pub async fn init(&self, req: &InitRequest) -> Result<()> {
        let url = format!("{}/init", self.base_url);
        tracing::debug!("Initiating rollout {} at {}", req.metadata.rollout_id, url);

        let response = self.client.post(&url).json(req).send().await?;

        handle_empty_response(response).await
    }

    /// Query the server's health endpoint
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }
}
