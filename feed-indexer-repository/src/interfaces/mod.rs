//! Interface definitions for the post store.
//!
//! This module defines the abstract `PostStore` trait that allows
//! for dependency injection and swappable storage backends.

mod post_store;

pub use post_store::PostStore;
