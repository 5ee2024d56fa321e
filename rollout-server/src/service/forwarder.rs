//! Collector forwarding
//!
//! Ships log records to the tracing collector in the background. Workers push
//! onto an unbounded channel through [`CollectorLogSink`] and never wait on
//! the network; a single [`LogForwarder`] task drains the channel in batches.

use rollout_client::CollectorClient;
use rollout_core::domain::log::LogRecord;
use std::mem;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tracing::{debug, warn};

use crate::service::log_sink::LogSink;

/// Sink half of the collector channel
#[derive(Clone)]
pub struct CollectorLogSink {
    tx: mpsc::UnboundedSender<LogRecord>,
}

impl LogSink for CollectorLogSink {
    fn emit(&self, record: LogRecord) {
        if self.tx.send(record).is_err() {
            warn!("Log forwarder has stopped; dropping log record");
        }
    }
}

/// Background task that posts batches to the collector
///
/// A batch is sent when it reaches `batch_size` records or when the send
/// interval elapses, whichever comes first. Once every sink handle has been
/// dropped, the remaining records are flushed and the task exits.
pub struct LogForwarder {
    rx: mpsc::UnboundedReceiver<LogRecord>,
    client: CollectorClient,
    send_interval: Duration,
    batch_size: usize,
}

impl LogForwarder {
    /// Creates a connected sink and forwarder pair
    pub fn channel(
        client: CollectorClient,
        send_interval: Duration,
        batch_size: usize,
    ) -> (CollectorLogSink, LogForwarder) {
        let (tx, rx) = mpsc::unbounded_channel();
        let forwarder = LogForwarder {
            rx,
            client,
            send_interval,
            batch_size: batch_size.max(1),
        };

        (CollectorLogSink { tx }, forwarder)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let LogForwarder {
            mut rx,
            client,
            send_interval,
            batch_size,
        } = self;

        let mut ticker = time::interval(send_interval);
        let mut pending: Vec<LogRecord> = Vec::new();

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(record) => {
                        pending.push(record);
                        if pending.len() >= batch_size {
                            flush(&client, &mut pending).await;
                        }
                    }
                    None => {
                        flush(&client, &mut pending).await;
                        break;
                    }
                },
                _ = ticker.tick() => flush(&client, &mut pending).await,
            }
        }

        debug!("Log forwarder stopped");
    }
}

async fn flush(client: &CollectorClient, pending: &mut Vec<LogRecord>) {
    if pending.is_empty() {
        return;
    }

    let batch = mem::take(pending);
    let count = batch.len();

    match client.send_logs(batch).await {
        Ok(()) => debug!("Sent {} log record(s) to collector", count),
        Err(e) => warn!("Failed to send {} log record(s) to collector: {}", count, e),
    }
}
