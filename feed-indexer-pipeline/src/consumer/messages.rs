//! Message types for the consumer.
//!
//! Defines the messages that flow from consumers to the orchestrator.

use serde_json::Value;

use crate::errors::PipelineError;
use feed_indexer_shared::PostBatch;

/// Messages that flow through the pipeline.
#[derive(Debug)]
pub enum StreamMessage {
    /// A decoded batch of post operations.
    Batch(PostBatch),
    /// Stream has ended.
    End,
    /// An error occurred while consuming; the consumer keeps going.
    Error(String),
}

/// Decode one batch payload.
///
/// The payload is a JSON object keyed by collection NSID; only the post
/// collection is read.
pub fn decode_batch(payload: &[u8]) -> Result<PostBatch, PipelineError> {
    let operations: Value = serde_json::from_slice(payload)
        .map_err(|e| PipelineError::parse(format!("Invalid batch JSON: {}", e)))?;

    if !operations.is_object() {
        return Err(PipelineError::parse("Batch payload must be a JSON object"));
    }

    PostBatch::from_operations(&operations)
        .map_err(|e| PipelineError::parse(format!("Invalid post operations: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_batch() {
        let payload = br#"{"app.bsky.feed.post":{"created":[{"uri":"at://1","cid":"c","author":"did:plc:a","record":{"text":"python","createdAt":"2024-01-01T00:00:00Z"}}],"deleted":[{"uri":"at://0"}]}}"#;

        let batch = decode_batch(payload).unwrap();
        assert_eq!(batch.created.len(), 1);
        assert_eq!(batch.deleted.len(), 1);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_batch(b"not json"), Err(PipelineError::ParseError(_))));
        assert!(matches!(decode_batch(b"[1, 2]"), Err(PipelineError::ParseError(_))));
    }

    #[test]
    fn test_decode_rejects_missing_record_fields() {
        let payload = br#"{"app.bsky.feed.post":{"created":[{"uri":"at://1","cid":"c","author":"did:plc:a","record":{"text":"python"}}]}}"#;
        assert!(matches!(decode_batch(payload), Err(PipelineError::ParseError(_))));
    }
}
