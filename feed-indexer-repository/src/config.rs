//! Configuration types for the post store.

/// Default database location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://feed.db";

/// Configuration for the post store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite connection url. The database file is created if missing.
    pub database_url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Maximum number of uris bound in a single delete statement.
    /// Larger delete lists are split into several statements run in one
    /// transaction. Set to None to always issue one statement.
    pub max_batch_size: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            max_batch_size: Some(500),
        }
    }
}

impl StoreConfig {
    /// Create a config for the given database url.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    /// Config for a private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` opens its own database, so the
    /// pool is pinned to a single connection.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            max_batch_size: Some(500),
        }
    }

    /// Set the connection pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the delete chunk size.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size);
        self
    }

    pub(crate) fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}
