//! # Feed Indexer
//!
//! Main library for the post feed indexer.
//!
//! This crate provides the entry point and configuration for running
//! the feed indexer pipeline.

pub mod config;

pub use config::{Dependencies, LogFormat};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] feed_indexer_pipeline::PipelineError),

    /// Storage error.
    #[error("Storage error: {0}")]
    StorageError(#[from] feed_indexer_repository::StorageError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
