//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the application's
//! [`CollabConfig`] with any problems reported as [`ConfigIssue`]s.

mod comments;
mod output;
mod proposals;
mod workspace;

pub use comments::FileCommentsConfig;
pub use output::FileOutputConfig;
pub use proposals::FileProposalsConfig;
pub use workspace::FileWorkspaceConfig;

use collab_application::CollabConfig;
use collab_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Defaults for new workspaces
    pub workspace: FileWorkspaceConfig,
    /// Vote thresholds and apply policy
    pub proposals: FileProposalsConfig,
    /// Comment limits
    pub comments: FileCommentsConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        self.to_collab_config().1
    }

    /// Build the engine configuration. Invalid values fall back to their
    /// defaults; the returned issues say which ones.
    pub fn to_collab_config(&self) -> (CollabConfig, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let (settings, ws_issues) = self.workspace.to_settings();
        issues.extend(ws_issues);
        let (visibility, vis_issues) = self.workspace.parse_default_visibility();
        issues.extend(vis_issues);
        let (comments, comment_issues) = self.comments.to_policy();
        issues.extend(comment_issues);
        let (proposals, proposal_issues) = self.proposals.to_policy();
        issues.extend(proposal_issues);

        let config =
            CollabConfig::new(settings, comments, proposals).with_default_visibility(visibility);
        (config, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_domain::{OutputFormat, Severity, Visibility};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[workspace]
max_members = 10
default_visibility = "public"

[proposals]
approve_threshold = 2
reject_threshold = 4

[comments]
max_length = 1000
default_limit = 20

[output]
format = "json"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let (collab, issues) = config.to_collab_config();
        assert!(issues.is_empty());
        assert_eq!(collab.workspace_defaults().max_members, 10);
        assert_eq!(collab.default_visibility(), Visibility::Public);
        assert_eq!(collab.proposals().rule.approve_threshold, 2);
        assert_eq!(collab.proposals().rule.reject_threshold, 4);
        assert_eq!(collab.comments().max_length, 1000);
        assert_eq!(collab.comments().default_limit, 20);
        assert_eq!(config.output.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[proposals]
block_apply_during_edit_session = true
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let (collab, _) = config.to_collab_config();
        assert!(collab.proposals().block_apply_during_edit_session);
        // Defaults should apply
        assert_eq!(collab.proposals().rule.approve_threshold, 3);
        assert_eq!(collab.workspace_defaults().max_members, 50);
        assert!(config.output.color);
    }

    #[test]
    fn test_default_config_matches_engine_defaults() {
        let (collab, issues) = FileConfig::default().to_collab_config();
        assert!(issues.is_empty());
        assert_eq!(collab, CollabConfig::default());
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let toml_str = r#"
[workspace]
default_visibility = "hidden"

[proposals]
reject_threshold = 0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.severity == Severity::Warning));
        assert!(ConfigIssue::has_errors(&issues));
    }
}
