//! Persisted post record.

use serde::{Deserialize, Serialize};

use crate::event::CreatedPost;

/// A post accepted into the feed.
///
/// Reply references are denormalized uris, not foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPost {
    /// Unique key.
    pub uri: String,
    pub cid: String,
    pub reply_parent: Option<String>,
    pub reply_root: Option<String>,
}

impl StoredPost {
    pub fn new(uri: impl Into<String>, cid: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            cid: cid.into(),
            reply_parent: None,
            reply_root: None,
        }
    }

    /// Set the reply thread uris.
    pub fn with_reply(mut self, root: impl Into<String>, parent: impl Into<String>) -> Self {
        self.reply_root = Some(root.into());
        self.reply_parent = Some(parent.into());
        self
    }
}

impl From<&CreatedPost> for StoredPost {
    fn from(post: &CreatedPost) -> Self {
        let (reply_root, reply_parent) = match &post.record.reply {
            Some(reply) => (Some(reply.root.uri.clone()), Some(reply.parent.uri.clone())),
            None => (None, None),
        };

        Self {
            uri: post.uri.clone(),
            cid: post.cid.clone(),
            reply_parent,
            reply_root,
        }
    }
}
