//! Revision proposal policy from TOML (`[proposals]` section)
//!
//! ```toml
//! [proposals]
//! approve_threshold = 3
//! reject_threshold = 3
//! block_apply_during_edit_session = false
//! ```
//!
//! Thresholds are snapshotted into each proposal when it is created, so
//! changing them never affects proposals already in flight.

use collab_application::ProposalPolicy;
use collab_domain::{ConfigIssue, DEFAULT_VOTE_THRESHOLD, ResolutionRule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProposalsConfig {
    /// Approvals needed to auto-approve
    pub approve_threshold: usize,
    /// Rejections needed to auto-reject
    pub reject_threshold: usize,
    /// Refuse to apply a revision while an edit session is live on the DTU
    pub block_apply_during_edit_session: bool,
}

impl Default for FileProposalsConfig {
    fn default() -> Self {
        Self {
            approve_threshold: DEFAULT_VOTE_THRESHOLD,
            reject_threshold: DEFAULT_VOTE_THRESHOLD,
            block_apply_during_edit_session: false,
        }
    }
}

impl FileProposalsConfig {
    /// Convert to the application policy. Zero thresholds are reported as
    /// errors and replaced by the default.
    pub fn to_policy(&self) -> (ProposalPolicy, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut threshold = |value: usize, field: &str| {
            if value == 0 {
                issues.push(ConfigIssue::zero_value(field));
                DEFAULT_VOTE_THRESHOLD
            } else {
                value
            }
        };
        let approve = threshold(self.approve_threshold, "proposals.approve_threshold");
        let reject = threshold(self.reject_threshold, "proposals.reject_threshold");

        let rule = ResolutionRule::new(approve, reject).unwrap_or_default();
        let policy = ProposalPolicy {
            rule,
            block_apply_during_edit_session: self.block_apply_during_edit_session,
        };
        (policy, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposals_config_default() {
        let (policy, issues) = FileProposalsConfig::default().to_policy();
        assert!(issues.is_empty());
        assert_eq!(policy, ProposalPolicy::default());
    }

    #[test]
    fn test_proposals_config_deserialize() {
        let toml_str = r#"
[proposals]
approve_threshold = 2
reject_threshold = 5
block_apply_during_edit_session = true
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let (policy, issues) = config.proposals.to_policy();
        assert!(issues.is_empty());
        assert_eq!(policy.rule.approve_threshold, 2);
        assert_eq!(policy.rule.reject_threshold, 5);
        assert!(policy.block_apply_during_edit_session);
    }

    #[test]
    fn test_zero_threshold_is_error() {
        let config = FileProposalsConfig {
            approve_threshold: 0,
            ..Default::default()
        };
        let (policy, issues) = config.to_policy();
        assert_eq!(policy.rule.approve_threshold, DEFAULT_VOTE_THRESHOLD);
        assert!(ConfigIssue::has_errors(&issues));
        assert!(issues[0].message.contains("proposals.approve_threshold"));
    }
}
