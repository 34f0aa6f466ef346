//! # Feed Indexer Shared
//!
//! Types shared between the feed indexer crates: the decoded post events
//! received from the stream and the records persisted in the post store.

mod event;
mod post;

pub use event::{
    CreatedPost, DeletedPost, Embed, PostBatch, PostEvent, PostRecord, ReplyRef, StrongRef,
    POST_COLLECTION,
};
pub use post::StoredPost;
