//! Batch handler for the feed indexer pipeline.
//!
//! Runs one post batch through the processor and the loader.

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::errors::PipelineError;
use crate::loader::FeedLoader;
use crate::processor::FeedProcessor;
use feed_indexer_shared::PostBatch;

/// What happened to one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Created posts received.
    pub received: usize,
    /// Created posts that passed the filter.
    pub accepted: usize,
    /// Rows removed by the delete pass.
    pub deleted: u64,
    /// Rows inserted by the insert pass.
    pub inserted: usize,
}

/// Filters a batch and applies it to the store.
///
/// Holds no state between batches other than what the store persists.
pub struct BatchHandler {
    processor: FeedProcessor,
    loader: FeedLoader,
}

impl BatchHandler {
    pub fn new(processor: FeedProcessor, loader: FeedLoader) -> Self {
        Self { processor, loader }
    }

    pub fn loader(&self) -> &FeedLoader {
        &self.loader
    }

    /// Handle a batch against the current time.
    pub async fn handle(&self, batch: &PostBatch) -> Result<BatchOutcome, PipelineError> {
        self.handle_at(batch, Utc::now()).await
    }

    /// Handle a batch against the given time.
    ///
    /// Parse and storage errors are returned as is; nothing is retried.
    #[instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn handle_at(
        &self,
        batch: &PostBatch,
        now: DateTime<Utc>,
    ) -> Result<BatchOutcome, PipelineError> {
        let processed = self.processor.process_batch_at(batch, now)?;
        if processed.is_empty() {
            return Ok(BatchOutcome {
                received: processed.received,
                ..Default::default()
            });
        }

        let summary = self.loader.load(&processed).await?;

        let outcome = BatchOutcome {
            received: processed.received,
            accepted: processed.to_create.len(),
            deleted: summary.deleted,
            inserted: summary.inserted,
        };

        info!(
            received = outcome.received,
            accepted = outcome.accepted,
            deleted = outcome.deleted,
            inserted = outcome.inserted,
            "Applied post batch"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::FilterConfig;
    use chrono::TimeZone;
    use feed_indexer_repository::{PostStore, SqlitePostStore, StorageError};
    use feed_indexer_shared::{CreatedPost, DeletedPost, PostRecord, StoredPost};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap()
    }

    fn post(uri: &str, text: &str) -> CreatedPost {
        CreatedPost::new(
            uri,
            format!("cid-{}", uri),
            "did:plc:author",
            PostRecord::new(text, "2024-06-02T11:30:00Z"),
        )
    }

    async fn setup(config: FilterConfig) -> (BatchHandler, Arc<SqlitePostStore>) {
        let store = Arc::new(SqlitePostStore::in_memory().await.unwrap());
        let handler = BatchHandler::new(
            FeedProcessor::new(config),
            FeedLoader::new(store.clone()),
        );
        (handler, store)
    }

    #[tokio::test]
    async fn test_python_post_is_stored() {
        let (handler, store) = setup(FilterConfig::default()).await;
        let batch = PostBatch::new(vec![post("at://p/1", "learning python today")], vec![]);

        let outcome = handler.handle_at(&batch, now()).await.unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(
            store.get_post("at://p/1").await.unwrap(),
            Some(StoredPost::new("at://p/1", "cid-at://p/1"))
        );
        assert_eq!(store.count_posts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reply_rejected_when_ignoring_replies() {
        let (handler, store) = setup(FilterConfig::default().with_ignore_replies(true)).await;
        let mut reply = post("at://p/1", "Python question");
        reply.record = reply.record.with_reply("at://root", "at://parent");

        let outcome = handler
            .handle_at(&PostBatch::new(vec![reply], vec![]), now())
            .await
            .unwrap();

        assert_eq!(outcome.accepted, 0);
        assert_eq!(store.count_posts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_matching_post_rejected() {
        let (handler, store) = setup(
            FilterConfig::default()
                .with_ignore_archived(true)
                .with_ignore_replies(true),
        )
        .await;

        handler
            .handle_at(&PostBatch::new(vec![post("at://p/1", "no match here")], vec![]), now())
            .await
            .unwrap();

        assert_eq!(store.count_posts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_only_batch() {
        let (handler, store) = setup(FilterConfig::default()).await;
        store
            .insert_posts(&[
                StoredPost::new("at://p/1", "c1"),
                StoredPost::new("at://p/2", "c2"),
                StoredPost::new("at://p/3", "c3"),
            ])
            .await
            .unwrap();

        let batch = PostBatch::new(
            vec![],
            vec![DeletedPost::new("at://p/1"), DeletedPost::new("at://p/2")],
        );
        let outcome = handler.handle_at(&batch, now()).await.unwrap();

        assert_eq!(outcome.deleted, 2);
        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.count_posts().await.unwrap(), 1);
        assert!(store.get_post("at://p/3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_insert_persists_nothing_from_batch() {
        let (handler, store) = setup(FilterConfig::default()).await;
        store
            .insert_posts(&[StoredPost::new("at://p/existing", "c0")])
            .await
            .unwrap();

        // Second post collides with a stored uri.
        let batch = PostBatch::new(
            vec![
                post("at://p/1", "python one"),
                post("at://p/existing", "python two"),
                post("at://p/3", "python three"),
            ],
            vec![],
        );
        let result = handler.handle_at(&batch, now()).await;

        assert!(matches!(
            result,
            Err(PipelineError::StorageError(StorageError::Conflict { .. }))
        ));
        assert_eq!(store.count_posts().await.unwrap(), 1);
        assert!(store.get_post("at://p/1").await.unwrap().is_none());
        assert!(store.get_post("at://p/3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_and_recreate_in_same_batch() {
        let (handler, store) = setup(FilterConfig::default()).await;
        store
            .insert_posts(&[StoredPost::new("at://p/1", "old-cid")])
            .await
            .unwrap();

        let batch = PostBatch::new(
            vec![post("at://p/1", "python, edited")],
            vec![DeletedPost::new("at://p/1")],
        );
        handler.handle_at(&batch, now()).await.unwrap();

        let stored = store.get_post("at://p/1").await.unwrap().unwrap();
        assert_eq!(stored.cid, "cid-at://p/1");
    }

    #[tokio::test]
    async fn test_parse_error_leaves_store_untouched() {
        let (handler, store) = setup(FilterConfig::default().with_ignore_archived(true)).await;
        store
            .insert_posts(&[StoredPost::new("at://p/keep", "c")])
            .await
            .unwrap();

        let mut bad = post("at://p/1", "python");
        bad.record.created_at = "garbage".to_string();
        let batch = PostBatch::new(vec![bad], vec![DeletedPost::new("at://p/keep")]);

        let result = handler.handle_at(&batch, now()).await;

        assert!(matches!(result, Err(PipelineError::ParseError(_))));
        assert_eq!(store.count_posts().await.unwrap(), 1);
    }
}
