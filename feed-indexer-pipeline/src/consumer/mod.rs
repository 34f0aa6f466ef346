//! Consumer module for the feed indexer pipeline.
//!
//! Provides consumers that receive decoded post batches and forward them
//! to the pipeline.

mod jsonl_consumer;
#[cfg(feature = "kafka")]
mod kafka_consumer;
mod messages;

pub use jsonl_consumer::{JsonlConsumer, JsonlInput};
#[cfg(feature = "kafka")]
pub use kafka_consumer::{KafkaConsumer, DEFAULT_POSTS_TOPIC};
pub use messages::{decode_batch, StreamMessage};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::errors::PipelineError;

/// A source of post batches.
///
/// Consumers push every decoded batch into `sender` in arrival order and
/// finish with [`StreamMessage::End`] when the input is exhausted or the
/// shutdown signal fires.
#[async_trait]
pub trait BatchConsumer: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &'static str;

    /// Consume until the input ends or `shutdown` fires.
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), PipelineError>;
}
