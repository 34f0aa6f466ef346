//! Storage error types.
//!
//! This module defines the error types that can occur during post store operations.

use thiserror::Error;

/// Errors that can occur during post store operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open or reach the database.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create the post table.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Delete pass failed.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// Insert pass failed. The insert transaction was rolled back.
    #[error("Insert error: {0}")]
    InsertError(String),

    /// A post with the same uri is already stored.
    #[error("Post already exists: {uri}")]
    Conflict { uri: String },

    /// Read query failed.
    #[error("Query error: {0}")]
    QueryError(String),
}

impl StorageError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    /// Create an insert error.
    pub fn insert(msg: impl Into<String>) -> Self {
        Self::InsertError(msg.into())
    }

    /// Create a conflict error for the given uri.
    pub fn conflict(uri: impl Into<String>) -> Self {
        Self::Conflict { uri: uri.into() }
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }
}
