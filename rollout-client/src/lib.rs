//! Rollout HTTP Clients
//!
//! Typed reqwest clients for the two HTTP edges of the rollout harness:
//!
//! - [`RolloutClient`]: used by the evaluation framework to initiate rollouts
//!   on a remote rollout server
//! - [`CollectorClient`]: used by the rollout server to ship log batches to the
//!   tracing collector
//!
//! # Example
//!
//! ```no_run
//! use rollout_client::RolloutClient;
//! use rollout_core::dto::init::{InitRequest, Message, RolloutMetadata};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = RolloutClient::new("http://127.0.0.1:3000");
//!
//!     let mut completion_params = serde_json::Map::new();
//!     completion_params.insert("model".into(), "accounts/fireworks/models/gpt-oss-120b".into());
//!
//!     client
//!         .init(&InitRequest {
//!             metadata: RolloutMetadata::generate(),
//!             messages: Some(vec![Message::user("What is the capital of France?")]),
//!             completion_params,
//!             tools: None,
//!             model_base_url: None,
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

mod collector;
pub mod error;
mod rollouts;

pub use collector::CollectorClient;
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for a remote rollout server
#[derive(Debug, Clone)]
pub struct RolloutClient {
    /// Base URL of the rollout server (e.g., "http://127.0.0.1:3000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl RolloutClient {
    /// Create a new rollout client
    ///
    /// # Example
    /// ```
    /// use rollout_client::RolloutClient;
    ///
    /// let client = RolloutClient::new("http://127.0.0.1:3000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new rollout client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the rollout server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Check the status code and deserialize a JSON body
pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Check the status code of a response whose body carries no meaning
pub(crate) async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(())
}
