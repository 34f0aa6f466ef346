//! SQLite client implementation.
//!
//! This module provides the concrete implementation of `PostStore`
//! using an `sqlx` SQLite connection pool.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info, instrument, warn};

use crate::config::StoreConfig;
use crate::errors::StorageError;
use crate::interfaces::PostStore;
use crate::sqlite::schema::{CREATE_INDEXED_AT_INDEX, CREATE_POST_TABLE};
use feed_indexer_shared::StoredPost;

/// SQLite-backed post store.
///
/// # Example
///
/// ```ignore
/// let store = SqlitePostStore::connect(&StoreConfig::new("sqlite://feed.db")).await?;
/// store.ensure_schema().await?;
/// store.insert_posts(&[StoredPost::new("at://did:plc:a/app.bsky.feed.post/1", "bafy")]).await?;
/// ```
pub struct SqlitePostStore {
    pool: SqlitePool,
    config: StoreConfig,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    uri: String,
    cid: String,
    reply_parent: Option<String>,
    reply_root: Option<String>,
}

impl From<PostRow> for StoredPost {
    fn from(row: PostRow) -> Self {
        Self {
            uri: row.uri,
            cid: row.cid,
            reply_parent: row.reply_parent,
            reply_root: row.reply_root,
        }
    }
}

impl SqlitePostStore {
    /// Open a connection pool for the configured database.
    ///
    /// # Returns
    ///
    /// * `Ok(SqlitePostStore)` - A new store instance
    /// * `Err(StorageError)` - If the url is invalid or the database can't be opened
    pub async fn connect(config: &StoreConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| StorageError::connection(e.to_string()))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            // Each connection sees its own database, and closing the only
            // connection drops it.
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StorageError::connection(e.to_string()))?;

        info!(
            database_url = %config.database_url,
            max_connections = config.max_connections,
            "Opened SQLite post store"
        );

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// Open a private in-memory store with the schema in place.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let store = Self::connect(&StoreConfig::in_memory()).await?;
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Close the pool, waiting for connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn delete_chunk_size(&self, total: usize) -> usize {
        match self.config.max_batch_size {
            Some(max) if max > 0 => max,
            _ => total.max(1),
        }
    }
}

/// Map an insert failure, reporting unique-key violations as conflicts.
fn insert_error(uri: &str, err: sqlx::Error) -> StorageError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => StorageError::conflict(uri),
        _ => StorageError::insert(format!("{}: {}", uri, err)),
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_POST_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::schema(e.to_string()))?;

        sqlx::query(CREATE_INDEXED_AT_INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::schema(e.to_string()))?;

        debug!("Post table ready");
        Ok(())
    }

    #[instrument(skip(self, uris), fields(uri_count = uris.len()))]
    async fn delete_posts(&self, uris: &[String]) -> Result<u64, StorageError> {
        if uris.is_empty() {
            return Ok(0);
        }

        // Chunks share one transaction so a failure leaves every row in place.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::connection(e.to_string()))?;

        let mut removed = 0;
        for chunk in uris.chunks(self.delete_chunk_size(uris.len())) {
            let mut builder: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new("DELETE FROM post WHERE uri IN (");
            let mut separated = builder.separated(", ");
            for uri in chunk {
                separated.push_bind(uri.as_str());
            }
            separated.push_unseparated(")");

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    warn!(error = %e, "Delete failed, rolling back batch");
                    StorageError::delete(e.to_string())
                })?;

            removed += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::delete(e.to_string()))?;

        debug!(requested = uris.len(), removed = removed, "Deleted posts");
        Ok(removed)
    }

    #[instrument(skip(self, posts), fields(post_count = posts.len()))]
    async fn insert_posts(&self, posts: &[StoredPost]) -> Result<(), StorageError> {
        if posts.is_empty() {
            return Ok(());
        }

        // Dropping the transaction on an early return rolls it back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::connection(e.to_string()))?;

        for post in posts {
            sqlx::query(
                "INSERT INTO post (uri, cid, reply_parent, reply_root) VALUES (?, ?, ?, ?)",
            )
            .bind(&post.uri)
            .bind(&post.cid)
            .bind(&post.reply_parent)
            .bind(&post.reply_root)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                warn!(uri = %post.uri, error = %e, "Insert failed, rolling back batch");
                insert_error(&post.uri, e)
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::insert(e.to_string()))?;

        debug!(count = posts.len(), "Inserted posts");
        Ok(())
    }

    async fn get_post(&self, uri: &str) -> Result<Option<StoredPost>, StorageError> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT uri, cid, reply_parent, reply_root FROM post WHERE uri = ?",
        )
        .bind(uri)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::query(e.to_string()))?;

        Ok(row.map(StoredPost::from))
    }

    async fn count_posts(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::query(e.to_string()))?;

        Ok(count.max(0) as u64)
    }

    async fn health_check(&self) -> Result<bool, StorageError> {
        let one: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::connection(e.to_string()))?;

        Ok(one == 1)
    }
}
