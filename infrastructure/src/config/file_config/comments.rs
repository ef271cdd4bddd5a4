//! Comment limits from TOML (`[comments]` section)

use collab_application::CommentPolicy;
use collab_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Raw comment configuration from TOML
///
/// ```toml
/// [comments]
/// max_length = 5000     # characters
/// default_limit = 50    # flat listing size when no limit is given
/// max_reply_depth = 64  # deepest reply nesting
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCommentsConfig {
    pub max_length: usize,
    pub default_limit: usize,
    pub max_reply_depth: usize,
}

impl Default for FileCommentsConfig {
    fn default() -> Self {
        let policy = CommentPolicy::default();
        Self {
            max_length: policy.max_length,
            default_limit: policy.default_limit,
            max_reply_depth: policy.max_reply_depth,
        }
    }
}

impl FileCommentsConfig {
    pub fn to_policy(&self) -> (CommentPolicy, Vec<ConfigIssue>) {
        let defaults = CommentPolicy::default();
        let mut issues = Vec::new();
        let mut pick = |value: usize, fallback: usize, field: &str| {
            if value == 0 {
                issues.push(ConfigIssue::zero_value(field));
                fallback
            } else {
                value
            }
        };
        let policy = CommentPolicy {
            max_length: pick(self.max_length, defaults.max_length, "comments.max_length"),
            default_limit: pick(
                self.default_limit,
                defaults.default_limit,
                "comments.default_limit",
            ),
            max_reply_depth: pick(
                self.max_reply_depth,
                defaults.max_reply_depth,
                "comments.max_reply_depth",
            ),
        };
        (policy, issues)
    }
}
