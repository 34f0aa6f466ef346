//! Error types for the feed indexer repository.

mod storage_error;

pub use storage_error::StorageError;
