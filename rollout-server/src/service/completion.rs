//! Completion backend
//!
//! Issues the chat completion call for a rollout. The trait keeps workers
//! independent of the provider so tests can script outcomes.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::time::Duration;
use thiserror::Error;

/// Failures inside a worker after the request was accepted
///
/// These never reach the caller of `/init`; the worker logs them and still
/// emits its terminal status.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse completion response: {0}")]
    Parse(String),

    #[error("failed to encode completion request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("rollout worker panicked: {0}")]
    Panicked(String),
}

/// Where a single completion call goes and with which credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionTarget {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends `kwargs` as the body of a chat completion and returns the raw response
    async fn create(
        &self,
        target: &CompletionTarget,
        kwargs: &Map<String, JsonValue>,
    ) -> Result<JsonValue, CompletionError>;
}

/// Backend for OpenAI-compatible `/chat/completions` endpoints
///
/// The underlying reqwest client and its connection pool are shared by all
/// workers; each call still targets its own base URL and key.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleBackend {
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(timeout: Option<Duration>) -> Result<Self, CompletionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompatibleBackend {
    async fn create(
        &self,
        target: &CompletionTarget,
        kwargs: &Map<String, JsonValue>,
    ) -> Result<JsonValue, CompletionError> {
        let url = format!("{}/chat/completions", target.base_url.trim_end_matches('/'));

        let mut request = self.client.post(&url).json(kwargs);
        if let Some(key) = &target.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| CompletionError::Parse(format!("{}; body: {}", e, text)))
    }
}
