//! Rollout Server binary

use anyhow::{Context, Result};
use clap::Parser;
use rollout_client::CollectorClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollout_server::config::{ServerArgs, ServerConfig};
use rollout_server::service::{
    FanoutLogSink, InitDispatcher, LogForwarder, LogSink, OpenAiCompatibleBackend, TracingLogSink,
};

const FORWARDER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollout_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rollout Server...");

    let config = ServerArgs::parse().into_config();
    config.validate().context("Invalid server configuration")?;

    if let Some(message) = &config.rollout.force_early_error {
        warn!("Force early error is set; every rollout will end with error: {}", message);
    }

    let backend = OpenAiCompatibleBackend::new(config.completion_timeout)
        .context("Failed to build completion client")?;

    let (sink, forwarder) = build_log_sink(&config);

    let dispatcher = InitDispatcher::new(config.rollout.clone(), Arc::new(backend), sink);
    let app = rollout_server::create_router(dispatcher.clone());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!(
        "Waiting up to {:?} for in-flight rollouts to finish...",
        config.shutdown_timeout
    );
    match dispatcher
        .registry()
        .drain_within(config.shutdown_timeout)
        .await
    {
        Ok(drained) => info!("{} rollout(s) finished during shutdown", drained),
        Err(drained) => {
            warn!(
                "Shutdown timed out after {} rollout(s) finished; still running: {:?}",
                drained,
                dispatcher.registry().active_ids()
            );
            // Aborted workers release their sink handles so the forwarder can close
            let aborted = dispatcher.registry().abort_all();
            warn!("Aborted {} rollout worker(s) without a terminal status", aborted);
        }
    }

    // Dropping the last sink handle lets the forwarder flush and exit
    drop(dispatcher);
    if let Some(handle) = forwarder {
        if tokio::time::timeout(FORWARDER_SHUTDOWN_TIMEOUT, handle)
            .await
            .is_err()
        {
            warn!("Timed out flushing log records to the collector");
        }
    }

    info!("Rollout Server stopped");
    Ok(())
}

/// Builds the sink every worker writes to
///
/// Records always go to the tracing output; with a collector configured they
/// are also forwarded there by a background task, whose handle is returned.
fn build_log_sink(config: &ServerConfig) -> (Arc<dyn LogSink>, Option<JoinHandle<()>>) {
    let Some(url) = &config.collector_url else {
        info!("No collector configured; rollout logs go to stdout only");
        return (Arc::new(TracingLogSink), None);
    };

    let mut client = CollectorClient::new(url.clone());
    if let Some(token) = &config.collector_token {
        client = client.with_token(token.clone());
    }

    info!("Forwarding rollout logs to collector at {}", client.base_url());

    let (collector_sink, forwarder) =
        LogForwarder::channel(client, config.log_send_interval, config.log_batch_size);

    let sinks: Vec<Arc<dyn LogSink>> = vec![Arc::new(TracingLogSink), Arc::new(collector_sink)];
    (Arc::new(FanoutLogSink::new(sinks)), Some(forwarder.spawn()))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = wait_for_ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                wait_for_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await;
    }

    info!("Shutdown signal received");
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
    }
}
