//! Workspace defaults from TOML (`[workspace]` section)

use collab_domain::{ConfigIssue, Visibility, WorkspaceSettings};
use serde::{Deserialize, Serialize};

/// Raw workspace defaults from TOML
///
/// # Example
///
/// ```toml
/// [workspace]
/// max_members = 50
/// allow_member_invite = true
/// require_approval_for_edits = true
/// default_visibility = "private"   # "private", "org" or "public"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkspaceConfig {
    /// Roster capacity, owner included
    pub max_members: usize,
    pub allow_member_invite: bool,
    pub require_approval_for_edits: bool,
    /// Visibility for workspaces created without one
    pub default_visibility: String,
}

impl Default for FileWorkspaceConfig {
    fn default() -> Self {
        let settings = WorkspaceSettings::default();
        Self {
            max_members: settings.max_members,
            allow_member_invite: settings.allow_member_invite,
            require_approval_for_edits: settings.require_approval_for_edits,
            default_visibility: "private".to_string(),
        }
    }
}

impl FileWorkspaceConfig {
    /// Convert to domain settings. A zero capacity is reported and replaced
    /// by the built-in default.
    pub fn to_settings(&self) -> (WorkspaceSettings, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut settings = WorkspaceSettings {
            allow_member_invite: self.allow_member_invite,
            require_approval_for_edits: self.require_approval_for_edits,
            ..WorkspaceSettings::default()
        };
        if self.max_members == 0 {
            issues.push(ConfigIssue::zero_value("workspace.max_members"));
        } else {
            settings.max_members = self.max_members;
        }
        (settings, issues)
    }

    /// Parse default_visibility, returning a warning on failure.
    pub fn parse_default_visibility(&self) -> (Visibility, Vec<ConfigIssue>) {
        match self.default_visibility.parse::<Visibility>() {
            Ok(visibility) => (visibility, vec![]),
            Err(_) => {
                let issue = ConfigIssue::invalid_enum(
                    "workspace.default_visibility",
                    &self.default_visibility,
                    &["private", "org", "public"],
                    "private",
                );
                (Visibility::default(), vec![issue])
            }
        }
    }
}
