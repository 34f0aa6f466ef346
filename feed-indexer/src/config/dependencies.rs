//! Dependency initialization and wiring for the feed indexer.

use std::env;
use std::sync::Arc;
use tracing::info;

use crate::IndexingError;
use feed_indexer_pipeline::{
    consumer::{BatchConsumer, JsonlConsumer, JsonlInput},
    handler::BatchHandler,
    loader::FeedLoader,
    orchestrator::{Orchestrator, OrchestratorConfig},
    processor::{is_enabled, FeedProcessor, FilterConfig},
};
use feed_indexer_repository::{
    config::DEFAULT_DATABASE_URL, PostStore, SqlitePostStore, StoreConfig,
};

/// Default pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default JSONL input (stdin).
const DEFAULT_FEED_INPUT: &str = "-";

/// Default Kafka consumer group ID.
#[cfg(feature = "kafka")]
const DEFAULT_KAFKA_GROUP_ID: &str = "feed-indexer";

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// The post store, kept for shutdown.
    pub store: Arc<SqlitePostStore>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: SQLite url (default: sqlite://feed.db)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
    /// - `FEED_INPUT`: JSONL input path, `-` for stdin (default: -)
    /// - `FEED_KEYWORD`, `IGNORE_ARCHIVED_POSTS`, `IGNORE_REPLY_POSTS`: filter settings
    /// - `STOP_ON_ERROR`: truthy to stop at the first failed batch
    /// - `KAFKA_BROKER`, `KAFKA_GROUP_ID`, `KAFKA_TOPIC`: Kafka input (with the `kafka` feature)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails
    pub async fn new() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok()).await
    }

    /// Initialize all dependencies from an arbitrary variable source.
    pub async fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.trim().parse::<u32>().map_err(|e| {
                IndexingError::config(format!("Invalid DATABASE_MAX_CONNECTIONS {:?}: {}", value, e))
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            return Err(IndexingError::config("DATABASE_MAX_CONNECTIONS must be at least 1"));
        }

        let filter_config = FilterConfig::from_lookup(&lookup)?;
        let orchestrator_config = OrchestratorConfig {
            stop_on_error: is_enabled(lookup("STOP_ON_ERROR").as_deref()),
            ..Default::default()
        };

        info!(
            database_url = %database_url,
            keyword = %filter_config.keyword(),
            ignore_archived = filter_config.ignore_archived,
            ignore_replies = filter_config.ignore_replies,
            "Initializing dependencies"
        );

        // Initialize post store
        let store_config = StoreConfig::new(database_url).with_max_connections(max_connections);
        let store = SqlitePostStore::connect(&store_config)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to open post store: {}", e)))?;

        // Verify the store answers
        let healthy = store
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("Post store health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("Post store is unhealthy"));
        }

        info!("Post store connection verified");

        let store = Arc::new(store);
        let consumer = build_consumer(&lookup)?;
        info!(consumer = consumer.name(), "Consumer created");

        let handler = BatchHandler::new(
            FeedProcessor::new(filter_config),
            FeedLoader::new(store.clone()),
        );

        // Create orchestrator
        let orchestrator = Orchestrator::with_config(consumer, handler, orchestrator_config);

        Ok(Self {
            orchestrator,
            store,
        })
    }
}

#[cfg(feature = "kafka")]
fn build_consumer<F>(lookup: &F) -> Result<Arc<dyn BatchConsumer>, IndexingError>
where
    F: Fn(&str) -> Option<String>,
{
    use feed_indexer_pipeline::consumer::{KafkaConsumer, DEFAULT_POSTS_TOPIC};

    match lookup("KAFKA_BROKER") {
        Some(broker) => {
            let group_id =
                lookup("KAFKA_GROUP_ID").unwrap_or_else(|| DEFAULT_KAFKA_GROUP_ID.to_string());
            let topic = lookup("KAFKA_TOPIC").unwrap_or_else(|| DEFAULT_POSTS_TOPIC.to_string());
            let consumer = KafkaConsumer::new(&broker, &group_id, &topic).map_err(|e| {
                IndexingError::config(format!("Failed to create Kafka consumer: {}", e))
            })?;
            Ok(Arc::new(consumer))
        }
        None => Ok(jsonl_consumer(lookup)),
    }
}

#[cfg(not(feature = "kafka"))]
fn build_consumer<F>(lookup: &F) -> Result<Arc<dyn BatchConsumer>, IndexingError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(jsonl_consumer(lookup))
}

fn jsonl_consumer<F>(lookup: &F) -> Arc<dyn BatchConsumer>
where
    F: Fn(&str) -> Option<String>,
{
    let input = lookup("FEED_INPUT").unwrap_or_else(|| DEFAULT_FEED_INPUT.to_string());
    Arc::new(JsonlConsumer::new(JsonlInput::parse(&input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[tokio::test]
    async fn test_wires_in_memory_store() {
        let deps = Dependencies::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("FEED_INPUT", "/tmp/does-not-matter.jsonl"),
        ]))
        .await
        .unwrap();

        assert!(deps.store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_bad_pool_size() {
        let result = Dependencies::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_MAX_CONNECTIONS", "lots"),
        ]))
        .await;

        assert!(matches!(result, Err(IndexingError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_rejects_empty_keyword() {
        let result = Dependencies::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("FEED_KEYWORD", ""),
        ]))
        .await;

        assert!(matches!(result, Err(IndexingError::PipelineError(_))));
    }
}
