//! Post store trait definition.
//!
//! This module defines the abstract interface for the persistent post index,
//! allowing for different backend implementations (SQLite, mock, etc.).

use async_trait::async_trait;

use crate::errors::StorageError;
use feed_indexer_shared::StoredPost;

/// Abstract interface for the persistent post index.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, StorageError>`. Implementations do not retry;
/// a failure is reported to the caller as is.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Create the post table if it doesn't exist.
    ///
    /// This should be called during application startup.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Delete every stored post whose uri is in `uris`.
    ///
    /// Uris that are not stored are ignored. The delete is atomic: on error
    /// no row has been removed.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of rows removed
    /// * `Err(StorageError)` - If the delete fails
    async fn delete_posts(&self, uris: &[String]) -> Result<u64, StorageError>;

    /// Insert all posts in a single transaction.
    ///
    /// Either every post is stored or none is. Inserting a uri that is
    /// already stored fails with [`StorageError::Conflict`].
    ///
    /// # Arguments
    ///
    /// * `posts` - Posts to insert, in insertion order
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If all posts were inserted and committed
    /// * `Err(StorageError)` - If any insert fails; nothing is persisted
    async fn insert_posts(&self, posts: &[StoredPost]) -> Result<(), StorageError>;

    /// Fetch a single post by uri.
    async fn get_post(&self, uri: &str) -> Result<Option<StoredPost>, StorageError>;

    /// Number of stored posts.
    async fn count_posts(&self) -> Result<u64, StorageError>;

    /// Check if the store is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the store answered
    /// * `Err(StorageError)` - If the check fails to execute
    async fn health_check(&self) -> Result<bool, StorageError>;
}
