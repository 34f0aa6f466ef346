//! Post table definition.

/// Table holding accepted posts.
pub const CREATE_POST_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS post (
    uri TEXT PRIMARY KEY NOT NULL,
    cid TEXT NOT NULL,
    reply_parent TEXT,
    reply_root TEXT,
    indexed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

pub const CREATE_INDEXED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_post_indexed_at ON post(indexed_at DESC)";
