//! Post events as delivered by the stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Collection NSID for feed posts.
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Reference to another record by uri and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    #[serde(default)]
    pub cid: String,
}

/// Thread position of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    /// First post of the thread.
    pub root: StrongRef,
    /// Post being replied to directly.
    pub parent: StrongRef,
}

/// Media attached to a post.
///
/// Only image embeds are distinguished; every other embed type decodes as
/// [`Embed::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum Embed {
    #[serde(rename = "app.bsky.embed.images")]
    Images {
        #[serde(default)]
        images: Vec<Value>,
    },
    #[serde(other)]
    Other,
}

/// Body of a post record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub text: String,
    /// Creation time as written by the author's client. Kept as the raw
    /// ISO-8601 string and parsed only when a predicate needs it.
    #[serde(alias = "created_at")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
}

impl PostRecord {
    /// Create a top-level post record without media.
    pub fn new(text: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: created_at.into(),
            reply: None,
            embed: None,
        }
    }

    /// Attach a reply reference.
    pub fn with_reply(mut self, root: impl Into<String>, parent: impl Into<String>) -> Self {
        self.reply = Some(ReplyRef {
            root: StrongRef {
                uri: root.into(),
                cid: String::new(),
            },
            parent: StrongRef {
                uri: parent.into(),
                cid: String::new(),
            },
        });
        self
    }

    /// Attach an embed.
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    /// Whether the post carries an image embed.
    pub fn has_images(&self) -> bool {
        matches!(self.embed, Some(Embed::Images { .. }))
    }
}

/// A newly created post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPost {
    pub uri: String,
    pub cid: String,
    /// DID of the author.
    pub author: String,
    pub record: PostRecord,
}

impl CreatedPost {
    pub fn new(
        uri: impl Into<String>,
        cid: impl Into<String>,
        author: impl Into<String>,
        record: PostRecord,
    ) -> Self {
        Self {
            uri: uri.into(),
            cid: cid.into(),
            author: author.into(),
            record,
        }
    }
}

/// A deleted post, identified by uri only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedPost {
    pub uri: String,
}

impl DeletedPost {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// A single post event.
#[derive(Debug, Clone, PartialEq)]
pub enum PostEvent {
    Created(CreatedPost),
    Deleted(DeletedPost),
}

/// Post creations and deletions delivered together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostBatch {
    #[serde(default)]
    pub created: Vec<CreatedPost>,
    #[serde(default)]
    pub deleted: Vec<DeletedPost>,
}

impl PostBatch {
    pub fn new(created: Vec<CreatedPost>, deleted: Vec<DeletedPost>) -> Self {
        Self { created, deleted }
    }

    /// Split a sequence of events into a batch, keeping arrival order
    /// within each list.
    #[cfg(test)]
    pub(crate) fn from_events(events: impl IntoIterator<Item = PostEvent>) -> Self {
        let mut batch = Self::default();
        for event in events {
            match event {
                PostEvent::Created(post) => batch.created.push(post),
                PostEvent::Deleted(post) => batch.deleted.push(post),
            }
        }
        batch
    }

    /// Extract the post operations from an object keyed by collection NSID.
    ///
    /// Other collections are ignored. A missing post entry yields an empty
    /// batch.
    pub fn from_operations(operations: &Value) -> Result<Self, serde_json::Error> {
        match operations.get(POST_COLLECTION) {
            Some(ops) => Self::deserialize(ops),
            None => Ok(Self::default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.deleted.len()
    }

    /// Uris of the deleted posts, in arrival order.
    pub fn deleted_uris(&self) -> Vec<String> {
        self.deleted.iter().map(|post| post.uri.clone()).collect()
    }
}
