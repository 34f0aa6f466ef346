//! Orchestrator module for the feed indexer pipeline.
//!
//! Coordinates the consumer and the batch handler.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, instrument, warn};

use crate::consumer::{BatchConsumer, StreamMessage};
use crate::errors::PipelineError;
use crate::handler::BatchHandler;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the message channel buffer.
    pub channel_buffer_size: usize,
    /// Stop at the first batch that fails instead of logging and moving on.
    pub stop_on_error: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 64,
            stop_on_error: false,
        }
    }
}

/// Totals over one orchestrator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub batches: usize,
    pub failed_batches: usize,
    pub accepted: usize,
    pub deleted: u64,
}

/// Orchestrator that coordinates the pipeline components.
///
/// The consumer runs on its own task; batches are handled here one at a
/// time in the order the consumer produced them.
pub struct Orchestrator {
    consumer: Arc<dyn BatchConsumer>,
    handler: BatchHandler,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(consumer: Arc<dyn BatchConsumer>, handler: BatchHandler) -> Self {
        Self::with_config(consumer, handler, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        consumer: Arc<dyn BatchConsumer>,
        handler: BatchHandler,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            consumer,
            handler,
            config,
            shutdown_tx,
        }
    }

    /// Run the orchestrator.
    ///
    /// Blocks until the input ends, a shutdown signal is received, or a
    /// batch fails while `stop_on_error` is set. A consumer failure, such
    /// as an unreadable input, is returned as an error.
    #[instrument(skip(self), fields(consumer = self.consumer.name()))]
    pub async fn run(&self) -> Result<RunStats, PipelineError> {
        info!("Starting feed indexer orchestrator");

        self.handler.loader().ensure_schema().await?;

        let (tx, mut rx) = mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);

        let consumer = self.consumer.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let consumer_handle = tokio::spawn(async move { consumer.run(tx, shutdown_rx).await });

        let mut stats = RunStats::default();
        let mut result = Ok(());
        let mut stopped_early = false;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(StreamMessage::Batch(batch)) => {
                            stats.batches += 1;
                            match self.handler.handle(&batch).await {
                                Ok(outcome) => {
                                    stats.accepted += outcome.accepted;
                                    stats.deleted += outcome.deleted;
                                }
                                Err(e) => {
                                    stats.failed_batches += 1;
                                    error!(error = %e, "Failed to handle batch");
                                    if self.config.stop_on_error {
                                        stopped_early = true;
                                        self.shutdown();
                                        result = Err(e);
                                        break;
                                    }
                                }
                            }
                        }
                        Some(StreamMessage::Error(e)) => {
                            warn!(error = %e, "Received error from consumer");
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Consumer stream ended");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    stopped_early = true;
                    self.shutdown();
                    break;
                }
            }
        }

        // Unblock a consumer waiting on a full channel.
        drop(rx);
        let consumer_result = match consumer_handle.await {
            Ok(Ok(())) => Ok(()),
            // Expected when the loop stopped reading first.
            Ok(Err(PipelineError::ChannelError(_))) if stopped_early => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(PipelineError::consumer(format!("Consumer task failed: {}", e))),
        };
        if let Err(e) = consumer_result {
            error!(error = %e, "Consumer error");
            if result.is_ok() {
                result = Err(e);
            }
        }

        info!(
            batches = stats.batches,
            failed = stats.failed_batches,
            accepted = stats.accepted,
            deleted = stats.deleted,
            "Orchestrator shutdown complete"
        );

        result.map(|_| stats)
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
