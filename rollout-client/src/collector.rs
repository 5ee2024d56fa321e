//! Tracing collector client

use reqwest::Client;
use rollout_core::domain::log::LogRecord;
use rollout_core::dto::log::LogBatch;

use crate::error::Result;
use crate::handle_empty_response;

/// HTTP client for the tracing collector that stores rollout log records
#[derive(Debug, Clone)]
pub struct CollectorClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl CollectorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            client,
        }
    }

    /// Sends `Authorization: Bearer <token>` with every batch
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a batch of log records
    ///
    /// Records are posted in the order given. An empty batch is not sent.
    pub async fn send_logs(&self, records: Vec<LogRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let url = format!("{}/logs", self.base_url);
        let mut request = self.client.post(&url).json(&LogBatch { records });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        handle_empty_response(response).await
    }
}
