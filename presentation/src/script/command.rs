//! Script command definitions
//!
//! One JSON object per line, discriminated by `op`:
//!
//! ```json
//! {"op": "create_workspace", "as": "ws", "owner_id": "u1", "name": "Research"}
//! {"op": "add_workspace_member", "workspace_id": "$ws", "user_id": "u2", "role": "editor"}
//! ```
//!
//! `as` binds the id of the result to a name; any later string value of the
//! form `$name` is replaced by the bound id before the command is decoded.

use collab_domain::{
    CommentId, DtuId, ProposalId, RevisionChanges, UserId, Visibility, WorkspaceId,
    WorkspaceSettings,
};
use serde::Deserialize;
use serde_json::Value;

/// A single engine operation read from a script line
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum ScriptCommand {
    // ==================== Workspaces ====================
    CreateWorkspace {
        owner_id: UserId,
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        visibility: Option<Visibility>,
        #[serde(default)]
        settings: Option<WorkspaceSettings>,
    },
    GetWorkspace {
        workspace_id: WorkspaceId,
    },
    ListWorkspaces {
        user_id: UserId,
    },
    GetWorkspaceRole {
        workspace_id: WorkspaceId,
        user_id: UserId,
    },
    AddWorkspaceMember {
        workspace_id: WorkspaceId,
        user_id: UserId,
        /// Parsed by the runner so a bad role is a validation failure
        role: String,
        #[serde(default)]
        invited_by: Option<UserId>,
    },
    RemoveWorkspaceMember {
        workspace_id: WorkspaceId,
        user_id: UserId,
    },
    AddDtuToWorkspace {
        workspace_id: WorkspaceId,
        dtu_id: DtuId,
    },

    // ==================== Comments ====================
    AddComment {
        dtu_id: DtuId,
        user_id: UserId,
        text: String,
        #[serde(default)]
        parent_id: Option<CommentId>,
    },
    GetComments {
        dtu_id: DtuId,
        #[serde(default)]
        tree: bool,
        #[serde(default)]
        limit: Option<usize>,
    },
    EditComment {
        comment_id: CommentId,
        user_id: UserId,
        text: String,
    },
    ResolveComment {
        comment_id: CommentId,
    },
    ReactToComment {
        comment_id: CommentId,
        user_id: UserId,
        emoji: String,
    },

    // ==================== Revision proposals ====================
    ProposeRevision {
        dtu_id: DtuId,
        user_id: UserId,
        changes: RevisionChanges,
        #[serde(default)]
        reason: Option<String>,
    },
    VoteOnRevision {
        proposal_id: ProposalId,
        user_id: UserId,
        vote: String,
    },
    GetRevisionProposals {
        dtu_id: DtuId,
        #[serde(default)]
        status: Option<String>,
    },
    GetRevisionProposal {
        proposal_id: ProposalId,
    },
    ApplyRevision {
        proposal_id: ProposalId,
        user_id: UserId,
    },
    WithdrawRevision {
        proposal_id: ProposalId,
        user_id: UserId,
    },

    // ==================== Edit sessions ====================
    StartEditSession {
        dtu_id: DtuId,
        user_id: UserId,
    },
    RecordEdit {
        dtu_id: DtuId,
        user_id: UserId,
        field: String,
        #[serde(default)]
        old_value: Value,
        new_value: Value,
    },
    EndEditSession {
        dtu_id: DtuId,
    },
    GetEditSession {
        dtu_id: DtuId,
    },
    GetConflictingEdits {
        dtu_id: DtuId,
        user_id: UserId,
        field: String,
        #[serde(default)]
        after_seq: u64,
    },
}

impl ScriptCommand {
    /// The `op` name this command was decoded from
    pub fn op(&self) -> &'static str {
        match self {
            ScriptCommand::CreateWorkspace { .. } => "create_workspace",
            ScriptCommand::GetWorkspace { .. } => "get_workspace",
            ScriptCommand::ListWorkspaces { .. } => "list_workspaces",
            ScriptCommand::GetWorkspaceRole { .. } => "get_workspace_role",
            ScriptCommand::AddWorkspaceMember { .. } => "add_workspace_member",
            ScriptCommand::RemoveWorkspaceMember { .. } => "remove_workspace_member",
            ScriptCommand::AddDtuToWorkspace { .. } => "add_dtu_to_workspace",
            ScriptCommand::AddComment { .. } => "add_comment",
            ScriptCommand::GetComments { .. } => "get_comments",
            ScriptCommand::EditComment { .. } => "edit_comment",
            ScriptCommand::ResolveComment { .. } => "resolve_comment",
            ScriptCommand::ReactToComment { .. } => "react_to_comment",
            ScriptCommand::ProposeRevision { .. } => "propose_revision",
            ScriptCommand::VoteOnRevision { .. } => "vote_on_revision",
            ScriptCommand::GetRevisionProposals { .. } => "get_revision_proposals",
            ScriptCommand::GetRevisionProposal { .. } => "get_revision_proposal",
            ScriptCommand::ApplyRevision { .. } => "apply_revision",
            ScriptCommand::WithdrawRevision { .. } => "withdraw_revision",
            ScriptCommand::StartEditSession { .. } => "start_edit_session",
            ScriptCommand::RecordEdit { .. } => "record_edit",
            ScriptCommand::EndEditSession { .. } => "end_edit_session",
            ScriptCommand::GetEditSession { .. } => "get_edit_session",
            ScriptCommand::GetConflictingEdits { .. } => "get_conflicting_edits",
        }
    }
}
