//! Loader module for the feed indexer pipeline.
//!
//! Applies processed batches to the post store.

use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::errors::PipelineError;
use crate::processor::ProcessedBatch;
use feed_indexer_repository::PostStore;

/// Counts from applying one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Rows actually removed by the delete pass.
    pub deleted: u64,
    /// Rows inserted by the insert pass.
    pub inserted: usize,
}

/// Loader that writes processed batches into the post store.
///
/// Each batch is applied in two passes: one bulk delete, then one
/// transactional insert of every accepted post. The delete pass always runs
/// first and is not part of the insert transaction. Failures are returned
/// to the caller without retrying.
pub struct FeedLoader {
    store: Arc<dyn PostStore>,
}

impl FeedLoader {
    /// Create a new loader over the given store.
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Apply a processed batch.
    #[instrument(skip(self, batch), fields(to_delete = batch.to_delete.len(), to_create = batch.to_create.len()))]
    pub async fn load(&self, batch: &ProcessedBatch) -> Result<LoadSummary, PipelineError> {
        let mut summary = LoadSummary::default();

        if !batch.to_delete.is_empty() {
            summary.deleted = self
                .store
                .delete_posts(&batch.to_delete)
                .await
                .map_err(|e| {
                    error!(error = %e, count = batch.to_delete.len(), "Failed to delete posts");
                    e
                })?;
            debug!(
                count = batch.to_delete.len(),
                removed = summary.deleted,
                "Deleted from feed"
            );
        }

        if !batch.to_create.is_empty() {
            self.store
                .insert_posts(&batch.to_create)
                .await
                .map_err(|e| {
                    error!(error = %e, count = batch.to_create.len(), "Failed to add posts");
                    e
                })?;
            summary.inserted = batch.to_create.len();
            debug!(count = summary.inserted, "Added to feed");
        }

        Ok(summary)
    }

    /// Ensure the post table exists.
    pub async fn ensure_schema(&self) -> Result<(), PipelineError> {
        self.store.ensure_schema().await.map_err(PipelineError::from)
    }

    /// Check if the store is reachable.
    pub async fn health_check(&self) -> Result<bool, PipelineError> {
        self.store.health_check().await.map_err(PipelineError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use feed_indexer_repository::StorageError;
    use feed_indexer_shared::StoredPost;
    use std::sync::Mutex;

    /// Mock store recording the order of calls.
    #[derive(Default)]
    struct MockPostStore {
        calls: Mutex<Vec<String>>,
        fail_inserts: bool,
        fail_deletes: bool,
    }

    impl MockPostStore {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PostStore for MockPostStore {
        async fn ensure_schema(&self) -> Result<(), StorageError> {
            Ok(())
        }

        async fn delete_posts(&self, uris: &[String]) -> Result<u64, StorageError> {
            self.calls.lock().unwrap().push(format!("delete:{}", uris.len()));
            if self.fail_deletes {
                return Err(StorageError::delete("disk full"));
            }
            Ok(uris.len() as u64)
        }

        async fn insert_posts(&self, posts: &[StoredPost]) -> Result<(), StorageError> {
            self.calls.lock().unwrap().push(format!("insert:{}", posts.len()));
            if self.fail_inserts {
                return Err(StorageError::conflict(&posts[0].uri));
            }
            Ok(())
        }

        async fn get_post(&self, _uri: &str) -> Result<Option<StoredPost>, StorageError> {
            Ok(None)
        }

        async fn count_posts(&self) -> Result<u64, StorageError> {
            Ok(0)
        }

        async fn health_check(&self) -> Result<bool, StorageError> {
            Ok(true)
        }
    }

    fn batch(creates: usize, deletes: usize) -> ProcessedBatch {
        ProcessedBatch {
            received: creates,
            to_create: (0..creates)
                .map(|i| StoredPost::new(format!("at://new/{}", i), "cid"))
                .collect(),
            to_delete: (0..deletes).map(|i| format!("at://old/{}", i)).collect(),
        }
    }

    #[tokio::test]
    async fn test_deletes_run_before_inserts() {
        let store = Arc::new(MockPostStore::default());
        let loader = FeedLoader::new(store.clone());

        let summary = loader.load(&batch(2, 3)).await.unwrap();

        assert_eq!(store.calls(), vec!["delete:3", "insert:2"]);
        assert_eq!(summary, LoadSummary { deleted: 3, inserted: 2 });
    }

    #[tokio::test]
    async fn test_empty_passes_are_skipped() {
        let store = Arc::new(MockPostStore::default());
        let loader = FeedLoader::new(store.clone());

        loader.load(&batch(0, 0)).await.unwrap();
        loader.load(&batch(0, 2)).await.unwrap();

        assert_eq!(store.calls(), vec!["delete:2"]);
    }

    #[tokio::test]
    async fn test_insert_failure_propagates() {
        let store = Arc::new(MockPostStore {
            fail_inserts: true,
            ..Default::default()
        });
        let loader = FeedLoader::new(store.clone());

        let result = loader.load(&batch(1, 1)).await;

        assert!(matches!(
            result,
            Err(PipelineError::StorageError(StorageError::Conflict { .. }))
        ));
        assert_eq!(store.calls(), vec!["delete:1", "insert:1"]);
    }

    #[tokio::test]
    async fn test_delete_failure_skips_insert() {
        let store = Arc::new(MockPostStore {
            fail_deletes: true,
            ..Default::default()
        });
        let loader = FeedLoader::new(store.clone());

        let result = loader.load(&batch(1, 1)).await;

        assert!(matches!(
            result,
            Err(PipelineError::StorageError(StorageError::DeleteError(_)))
        ));
        assert_eq!(store.calls(), vec!["delete:1"]);
    }
}
