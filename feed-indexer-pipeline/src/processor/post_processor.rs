//! Feed processor implementation.
//!
//! Filters created posts by keyword and ignore policy and turns the
//! accepted ones into `StoredPost` records.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::errors::PipelineError;
use crate::processor::filter_config::FilterConfig;
use crate::processor::predicates::{is_archive_post, is_reply};
use feed_indexer_shared::{CreatedPost, PostBatch, PostRecord, StoredPost};

/// Result of filtering one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedBatch {
    /// Number of created posts examined.
    pub received: usize,
    /// Accepted posts, in arrival order.
    pub to_create: Vec<StoredPost>,
    /// Uris to remove from the store.
    pub to_delete: Vec<String>,
}

impl ProcessedBatch {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Processor that decides which created posts enter the feed.
///
/// A post is accepted when its text contains the configured keyword
/// (case-insensitive) and the ignore policy doesn't drop it:
/// `(ignore_archived && archived) || (ignore_replies && reply)`.
pub struct FeedProcessor {
    config: FilterConfig,
}

impl FeedProcessor {
    /// Create a new processor with the given filter settings.
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Process a batch against the current time.
    pub fn process_batch(&self, batch: &PostBatch) -> Result<ProcessedBatch, PipelineError> {
        self.process_batch_at(batch, Utc::now())
    }

    /// Process a batch against the given time.
    ///
    /// # Returns
    ///
    /// * `Ok(ProcessedBatch)` - Accepted records and uris to delete
    /// * `Err(PipelineError::ParseError)` - If an archive check hits a malformed timestamp
    #[instrument(skip(self, batch), fields(created = batch.created.len(), deleted = batch.deleted.len()))]
    pub fn process_batch_at(
        &self,
        batch: &PostBatch,
        now: DateTime<Utc>,
    ) -> Result<ProcessedBatch, PipelineError> {
        let mut to_create = Vec::new();

        for post in &batch.created {
            if let Some(stored) = self.process_post(post, now)? {
                to_create.push(stored);
            }
        }

        debug!(accepted = to_create.len(), "Processed post batch");

        Ok(ProcessedBatch {
            received: batch.created.len(),
            to_create,
            to_delete: batch.deleted_uris(),
        })
    }

    /// Process a single created post.
    fn process_post(
        &self,
        post: &CreatedPost,
        now: DateTime<Utc>,
    ) -> Result<Option<StoredPost>, PipelineError> {
        let record = &post.record;
        let inlined_text = record.text.replace('\n', " ");
        debug!(
            created_at = %record.created_at,
            author = %post.author,
            with_image = record.has_images(),
            "New post: {}",
            inlined_text
        );

        if !self.matches_keyword(&record.text) {
            return Ok(None);
        }

        if self.should_ignore(record, now)? {
            debug!(uri = %post.uri, "Ignoring post by policy");
            return Ok(None);
        }

        Ok(Some(StoredPost::from(post)))
    }

    /// Case-insensitive substring test against the configured keyword.
    pub fn matches_keyword(&self, text: &str) -> bool {
        text.to_lowercase().contains(self.config.keyword())
    }

    /// Apply the ignore policy.
    ///
    /// The timestamp is only parsed when archived posts are being ignored.
    pub fn should_ignore(
        &self,
        record: &PostRecord,
        now: DateTime<Utc>,
    ) -> Result<bool, PipelineError> {
        if self.config.ignore_archived && is_archive_post(&record.created_at, now)? {
            return Ok(true);
        }
        if self.config.ignore_replies && is_reply(record) {
            return Ok(true);
        }
        Ok(false)
    }
}

impl Default for FeedProcessor {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
