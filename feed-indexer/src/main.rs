//! Feed indexer daemon.
//!
//! Reads decoded post batches, keeps the posts matching the feed filter in
//! the post store, and removes deleted posts from it.
//!
//! # Usage
//!
//! ```bash
//! # Read batches from stdin into ./feed.db
//! firehose-decoder | feed-indexer
//!
//! # Read a recorded file, dropping replies
//! FEED_INPUT=batches.jsonl IGNORE_REPLY_POSTS=true feed-indexer
//! ```

use std::env;

use feed_indexer::{config::init_tracing, Dependencies, IndexingError, LogFormat};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv::dotenv().ok();

    init_tracing(LogFormat::parse(env::var("LOG_FORMAT").ok().as_deref()));

    let deps = match Dependencies::new().await {
        Ok(deps) => deps,
        Err(e) => {
            error!(error = %e, "Failed to initialize feed indexer");
            return Err(e);
        }
    };

    let result = deps.orchestrator.run().await;
    deps.store.close().await;

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "Feed indexer failed");
            return Err(e.into());
        }
    };
    info!(
        batches = stats.batches,
        failed = stats.failed_batches,
        accepted = stats.accepted,
        "Feed indexer stopped"
    );

    Ok(())
}
