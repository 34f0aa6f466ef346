//! Feed filter configuration.

use std::env;

use crate::errors::PipelineError;
use crate::processor::predicates::is_enabled;

/// Keyword used when `FEED_KEYWORD` is not set.
pub const DEFAULT_KEYWORD: &str = "python";

const KEYWORD_VAR: &str = "FEED_KEYWORD";
const IGNORE_ARCHIVED_VAR: &str = "IGNORE_ARCHIVED_POSTS";
const IGNORE_REPLIES_VAR: &str = "IGNORE_REPLY_POSTS";

/// Settings that decide which created posts enter the feed.
///
/// Built once by the caller and handed to the processor; the processor
/// never reads the environment itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    keyword: String,
    /// Drop posts older than the archive threshold.
    pub ignore_archived: bool,
    /// Drop replies.
    pub ignore_replies: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            keyword: DEFAULT_KEYWORD.to_string(),
            ignore_archived: false,
            ignore_replies: false,
        }
    }
}

impl FilterConfig {
    /// Create a config matching `keyword` with both ignore flags off.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().to_lowercase(),
            ..Default::default()
        }
    }

    /// Lowercased keyword that must appear in the post text.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Read the config from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FEED_KEYWORD`: keyword to match (default: python)
    /// - `IGNORE_ARCHIVED_POSTS`: truthy to drop archived posts
    /// - `IGNORE_REPLY_POSTS`: truthy to drop replies
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let keyword = lookup(KEYWORD_VAR).unwrap_or_else(|| DEFAULT_KEYWORD.to_string());
        if keyword.trim().is_empty() {
            return Err(PipelineError::processor(format!(
                "{} must not be empty",
                KEYWORD_VAR
            )));
        }

        Ok(Self {
            keyword: keyword.trim().to_lowercase(),
            ignore_archived: is_enabled(lookup(IGNORE_ARCHIVED_VAR).as_deref()),
            ignore_replies: is_enabled(lookup(IGNORE_REPLIES_VAR).as_deref()),
        })
    }

    /// Set the archive flag.
    pub fn with_ignore_archived(mut self, ignore: bool) -> Self {
        self.ignore_archived = ignore;
        self
    }

    /// Set the reply flag.
    pub fn with_ignore_replies(mut self, ignore: bool) -> Self {
        self.ignore_replies = ignore;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = FilterConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    fn test_flags_and_keyword_from_lookup() {
        let config = FilterConfig::from_lookup(lookup_from(&[
            ("FEED_KEYWORD", " Rust "),
            ("IGNORE_ARCHIVED_POSTS", "Yes"),
            ("IGNORE_REPLY_POSTS", "nope"),
        ]))
        .unwrap();

        assert_eq!(config.keyword(), "rust");
        assert!(config.ignore_archived);
        assert!(!config.ignore_replies);
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let result = FilterConfig::from_lookup(lookup_from(&[("FEED_KEYWORD", "  ")]));
        assert!(matches!(result, Err(PipelineError::ProcessorError(_))));
    }

    #[test]
    fn test_new_lowercases_keyword() {
        assert_eq!(FilterConfig::new("PyThOn").keyword(), "python");
    }
}
