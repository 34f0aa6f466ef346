//! # Feed Indexer Repository
//!
//! This crate provides the post store interface used by the feed indexer,
//! its error types, and a concrete implementation backed by SQLite.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod sqlite;

pub use config::StoreConfig;
pub use errors::StorageError;
pub use interfaces::PostStore;
pub use sqlite::SqlitePostStore;
