//! Processor module for the feed indexer pipeline.
//!
//! Decides which created posts enter the feed and turns them into
//! storage records.

mod filter_config;
mod post_processor;
mod predicates;

pub use filter_config::{FilterConfig, DEFAULT_KEYWORD};
pub use post_processor::{FeedProcessor, ProcessedBatch};
pub use predicates::{
    is_archive_post, is_enabled, is_reply, parse_created_at, ARCHIVE_THRESHOLD_HOURS,
};
