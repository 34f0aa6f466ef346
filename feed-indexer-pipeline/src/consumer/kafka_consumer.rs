//! Kafka consumer implementation for the feed indexer.
//!
//! Consumes JSON-encoded post batches from a Kafka topic and forwards them
//! to the pipeline.

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    message::Message as KafkaMessage,
    TopicPartitionList,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument};

use crate::consumer::messages::{decode_batch, StreamMessage};
use crate::consumer::BatchConsumer;
use crate::errors::PipelineError;

/// Topic carrying decoded firehose post operations.
pub const DEFAULT_POSTS_TOPIC: &str = "firehose.posts";

/// Kafka consumer for post batches.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group ID
    /// * `topic` - Topic carrying post batches
    ///
    /// # Returns
    ///
    /// * `Ok(KafkaConsumer)` - A new consumer instance
    /// * `Err(PipelineError)` - If consumer creation fails
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> Result<Self, PipelineError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()?;

        info!(brokers = %brokers, group_id = %group_id, topic = %topic, "Created Kafka consumer");

        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }

    /// Subscribe to the configured topic.
    pub fn subscribe(&self) -> Result<(), PipelineError> {
        self.consumer.subscribe(&[self.topic.as_str()])?;

        info!(topic = %self.topic, "Subscribed to Kafka topic");
        Ok(())
    }

    /// Process a single Kafka message.
    async fn process_message(
        &self,
        msg: &rdkafka::message::BorrowedMessage<'_>,
        sender: &mpsc::Sender<StreamMessage>,
    ) -> Result<(), PipelineError> {
        let partition = msg.partition();
        let offset = msg.offset();

        match msg.payload() {
            Some(payload) => {
                debug!(partition = partition, offset = offset, "Processing message");
                let message = match decode_batch(payload) {
                    Ok(batch) => StreamMessage::Batch(batch),
                    Err(e) => {
                        error!(partition = partition, offset = offset, error = %e, "Failed to decode batch");
                        StreamMessage::Error(format!("offset {}: {}", offset, e))
                    }
                };

                sender
                    .send(message)
                    .await
                    .map_err(|e| PipelineError::ChannelError(e.to_string()))?;
            }
            None => debug!(offset = offset, "Received message with empty payload"),
        }

        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(msg.topic(), partition, rdkafka::Offset::Offset(offset + 1))?;
        self.consumer
            .commit(&tpl, rdkafka::consumer::CommitMode::Async)?;

        Ok(())
    }
}

#[async_trait]
impl BatchConsumer for KafkaConsumer {
    fn name(&self) -> &'static str {
        "kafka"
    }

    #[instrument(skip(self, sender, shutdown))]
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), PipelineError> {
        use futures::StreamExt;

        self.subscribe()?;
        let mut message_stream = self.consumer.stream();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Consumer received shutdown signal");
                    let _ = sender.send(StreamMessage::End).await;
                    break;
                }
                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            if let Err(e) = self.process_message(&msg, &sender).await {
                                error!(error = %e, "Failed to process message");
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka error");
                            let _ = sender.send(StreamMessage::Error(e.to_string())).await;
                        }
                        None => {
                            info!("Kafka stream ended");
                            let _ = sender.send(StreamMessage::End).await;
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
