//! JSONL consumer implementation.
//!
//! Reads one batch per line from a file or stdin and forwards the decoded
//! batches to the pipeline.

use std::path::PathBuf;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, error, info, instrument};

use crate::consumer::messages::{decode_batch, StreamMessage};
use crate::consumer::BatchConsumer;
use crate::errors::PipelineError;

/// Where the JSONL consumer reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonlInput {
    Stdin,
    File(PathBuf),
}

impl JsonlInput {
    /// `-` means stdin, anything else is a file path.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "-" => Self::Stdin,
            path => Self::File(PathBuf::from(path)),
        }
    }
}

/// Consumer for newline-delimited JSON batches.
pub struct JsonlConsumer {
    input: JsonlInput,
}

impl JsonlConsumer {
    pub fn new(input: JsonlInput) -> Self {
        Self { input }
    }

    async fn open(&self) -> Result<Box<dyn AsyncRead + Unpin + Send>, PipelineError> {
        match &self.input {
            JsonlInput::Stdin => Ok(Box::new(tokio::io::stdin())),
            JsonlInput::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    PipelineError::consumer(format!("Failed to open {}: {}", path.display(), e))
                })?;
                Ok(Box::new(file))
            }
        }
    }
}

#[async_trait]
impl BatchConsumer for JsonlConsumer {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    #[instrument(skip(self, sender, shutdown))]
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), PipelineError> {
        let reader = self.open().await?;
        let mut lines = LinesStream::new(BufReader::new(reader).lines());
        let mut line_number = 0usize;

        info!(input = ?self.input, "Reading post batches");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Consumer received shutdown signal");
                    break;
                }
                line = lines.next() => {
                    match line {
                        Some(Ok(line)) => {
                            line_number += 1;
                            if line.trim().is_empty() {
                                continue;
                            }

                            let message = match decode_batch(line.as_bytes()) {
                                Ok(batch) => {
                                    debug!(line = line_number, events = batch.len(), "Decoded batch");
                                    StreamMessage::Batch(batch)
                                }
                                Err(e) => {
                                    error!(line = line_number, error = %e, "Failed to decode batch");
                                    StreamMessage::Error(format!("line {}: {}", line_number, e))
                                }
                            };

                            sender
                                .send(message)
                                .await
                                .map_err(|e| PipelineError::ChannelError(e.to_string()))?;
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Failed to read input");
                            let _ = sender.send(StreamMessage::End).await;
                            return Err(PipelineError::from(e));
                        }
                        None => {
                            info!(lines = line_number, "Input ended");
                            break;
                        }
                    }
                }
            }
        }

        let _ = sender.send(StreamMessage::End).await;
        Ok(())
    }
}
