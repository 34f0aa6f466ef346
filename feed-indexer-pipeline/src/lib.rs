//! # Feed Indexer Pipeline
//!
//! This crate provides the pipeline components for consuming post event
//! batches and keeping the feed's post store in sync with them.
//!
//! ## Architecture
//!
//! The pipeline follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Receives decoded post batches (JSONL input, or Kafka)
//! 2. **Processor**: Filters created posts into storage records
//! 3. **Loader**: Applies deletes, then inserts accepted posts in one transaction
//! 4. **Handler**: Runs one batch through processor and loader
//! 5. **Orchestrator**: Coordinates the pipeline flow

pub mod consumer;
pub mod errors;
pub mod handler;
pub mod loader;
pub mod orchestrator;
pub mod processor;

pub use errors::PipelineError;
