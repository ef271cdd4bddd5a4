//! Collaboration engine configuration.
//!
//! [`CollabConfig`] groups the policies each component reads:
//!
//! | Type | Used by |
//! |------|---------|
//! | `WorkspaceSettings` | `WorkspaceRegistry` (defaults for new workspaces) |
//! | `CommentPolicy` | `CommentThreadStore` |
//! | `ProposalPolicy` | `RevisionProposalEngine`, `CollabService::apply_revision` |
//!
//! Configuration is fixed once the service is constructed.

use collab_domain::{
    DEFAULT_COMMENT_LIMIT, MAX_COMMENT_LENGTH, MAX_REPLY_DEPTH, ResolutionRule, Visibility,
    WorkspaceSettings,
};

/// How revision proposals are resolved and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalPolicy {
    /// Rule snapshotted into each new proposal.
    pub rule: ResolutionRule,
    /// Refuse `apply_revision` while a live edit session is active on the DTU.
    pub block_apply_during_edit_session: bool,
}

impl Default for ProposalPolicy {
    fn default() -> Self {
        Self {
            rule: ResolutionRule::default(),
            block_apply_during_edit_session: false,
        }
    }
}

/// Limits for comment threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPolicy {
    pub max_length: usize,
    pub default_limit: usize,
    /// Deepest reply nesting accepted by `add_comment`.
    pub max_reply_depth: usize,
}

impl Default for CommentPolicy {
    fn default() -> Self {
        Self {
            max_length: MAX_COMMENT_LENGTH,
            default_limit: DEFAULT_COMMENT_LIMIT,
            max_reply_depth: MAX_REPLY_DEPTH,
        }
    }
}

/// Configuration container for [`CollabService`](crate::CollabService).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollabConfig {
    workspace_defaults: WorkspaceSettings,
    default_visibility: Visibility,
    comments: CommentPolicy,
    proposals: ProposalPolicy,
}

impl CollabConfig {
    pub fn new(
        workspace_defaults: WorkspaceSettings,
        comments: CommentPolicy,
        proposals: ProposalPolicy,
    ) -> Self {
        Self {
            workspace_defaults,
            default_visibility: Visibility::default(),
            comments,
            proposals,
        }
    }

    // ==================== Accessors ====================

    /// Settings applied to workspaces created without explicit settings.
    pub fn workspace_defaults(&self) -> &WorkspaceSettings {
        &self.workspace_defaults
    }

    pub fn default_visibility(&self) -> Visibility {
        self.default_visibility
    }

    pub fn comments(&self) -> &CommentPolicy {
        &self.comments
    }

    pub fn proposals(&self) -> &ProposalPolicy {
        &self.proposals
    }

    // ==================== Builder Methods ====================

    pub fn with_resolution_rule(mut self, rule: ResolutionRule) -> Self {
        self.proposals.rule = rule;
        self
    }

    pub fn with_block_apply_during_edit_session(mut self, block: bool) -> Self {
        self.proposals.block_apply_during_edit_session = block;
        self
    }

    pub fn with_default_max_members(mut self, max_members: usize) -> Self {
        self.workspace_defaults.max_members = max_members;
        self
    }

    pub fn with_default_visibility(mut self, visibility: Visibility) -> Self {
        self.default_visibility = visibility;
        self
    }

    pub fn with_comment_policy(mut self, comments: CommentPolicy) -> Self {
        self.comments = comments;
        self
    }
}
