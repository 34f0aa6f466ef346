//! SQLite implementation of the post store.

mod client;
mod schema;

pub use client::SqlitePostStore;
