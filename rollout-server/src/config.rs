//! Server configuration
//!
//! Defines all configurable parameters for the rollout server: the listen
//! address, the rollout settings threaded into every worker, and the
//! tracing collector connection.

use clap::Parser;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_KEY_ENV: &str = "FIREWORKS_API_KEY";
pub const DEFAULT_MODEL_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Command-line arguments, each with an environment fallback
#[derive(Debug, Parser)]
#[command(name = "rollout-server")]
#[command(about = "Remote rollout server for the evaluation protocol", long_about = None)]
pub struct ServerArgs {
    /// Host to bind the server to
    #[arg(long, env = "REMOTE_SERVER_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind the server to
    #[arg(long, env = "REMOTE_SERVER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// If set, every rollout ends with an error status carrying this message
    #[arg(long, env = "FORCE_EARLY_ERROR")]
    pub force_early_error: Option<String>,

    /// Name of the environment variable holding the model provider API key
    #[arg(long, default_value = DEFAULT_API_KEY_ENV)]
    pub api_key_env: String,

    /// Base URL used when a request carries no model_base_url
    #[arg(long, env = "DEFAULT_MODEL_BASE_URL", default_value = DEFAULT_MODEL_BASE_URL)]
    pub default_model_base_url: String,

    /// HTTP timeout for the completion call, in seconds
    #[arg(long)]
    pub completion_timeout_secs: Option<u64>,

    /// Tracing collector base URL; log records only go to stdout when unset
    #[arg(long, env = "ROLLOUT_COLLECTOR_URL")]
    pub collector_url: Option<String>,

    /// Bearer token for the tracing collector
    #[arg(long, env = "ROLLOUT_COLLECTOR_TOKEN", hide_env_values = true)]
    pub collector_token: Option<String>,

    /// How often buffered log records are shipped to the collector, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub log_send_interval_ms: u64,

    /// Maximum number of log records per collector batch
    #[arg(long, default_value_t = 100)]
    pub log_batch_size: usize,

    /// How long shutdown waits for in-flight rollouts, in seconds
    #[arg(long, env = "ROLLOUT_SHUTDOWN_TIMEOUT_SECS", default_value_t = DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    pub shutdown_timeout_secs: u64,
}

impl ServerArgs {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            rollout: RolloutSettings {
                force_early_error: self.force_early_error,
                api_key_env: self.api_key_env,
                default_model_base_url: self.default_model_base_url,
            },
            completion_timeout: self.completion_timeout_secs.map(Duration::from_secs),
            collector_url: self.collector_url,
            collector_token: self.collector_token,
            log_send_interval: Duration::from_millis(self.log_send_interval_ms),
            log_batch_size: self.log_batch_size,
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Settings shared read-only with every rollout worker
    pub rollout: RolloutSettings,

    /// Timeout of the completion HTTP client (none by default)
    pub completion_timeout: Option<Duration>,

    pub collector_url: Option<String>,
    pub collector_token: Option<String>,
    pub log_send_interval: Duration,
    pub log_batch_size: usize,

    /// Upper bound on waiting for in-flight rollouts at shutdown
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.is_empty() {
            anyhow::bail!("host cannot be empty");
        }

        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if !is_http_url(&self.rollout.default_model_base_url) {
            anyhow::bail!("default_model_base_url must start with http:// or https://");
        }

        if self.rollout.api_key_env.is_empty() {
            anyhow::bail!("api_key_env cannot be empty");
        }

        if let Some(url) = &self.collector_url {
            if !is_http_url(url) {
                anyhow::bail!("collector_url must start with http:// or https://");
            }
        }

        if self.log_send_interval.is_zero() {
            anyhow::bail!("log_send_interval must be greater than 0");
        }

        if self.log_batch_size == 0 {
            anyhow::bail!("log_batch_size must be greater than 0");
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            rollout: RolloutSettings::default(),
            completion_timeout: None,
            collector_url: None,
            collector_token: None,
            log_send_interval: Duration::from_secs(1),
            log_batch_size: 100,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

/// Process-wide rollout settings
///
/// Fixed at startup and shared behind an `Arc` with every worker.
#[derive(Debug, Clone)]
pub struct RolloutSettings {
    /// Forces every rollout to end with `Error(message)`
    pub force_early_error: Option<String>,

    /// Environment variable read for the API key on every completion call
    pub api_key_env: String,

    pub default_model_base_url: String,
}

impl RolloutSettings {
    /// Reads the API key from the environment
    ///
    /// Looked up on every call, never cached. Unset and empty both yield `None`.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn with_force_early_error(mut self, message: impl Into<String>) -> Self {
        self.force_early_error = Some(message.into());
        self
    }
}

impl Default for RolloutSettings {
    fn default() -> Self {
        Self {
            force_early_error: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            default_model_base_url: DEFAULT_MODEL_BASE_URL.to_string(),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
