//! Configuration and dependency wiring for the feed indexer.

mod dependencies;
mod logging;

pub use dependencies::Dependencies;
pub use logging::{init_tracing, LogFormat};
