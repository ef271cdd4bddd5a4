//! Workspace entities and roster invariants

use crate::core::error::{CollabError, CollabResult};
use crate::core::ids::{DtuId, UserId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a member within a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Admin,
    Owner,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Viewer, Role::Editor, Role::Admin, Role::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = CollabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(CollabError::validation(format!(
                "Invalid role '{}'. Must be one of: viewer, editor, admin, owner",
                other
            ))),
        }
    }
}

/// Who can see a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Org,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Org => "org",
            Visibility::Public => "public",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = CollabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "org" => Ok(Visibility::Org),
            "public" => Ok(Visibility::Public),
            other => Err(CollabError::validation(format!(
                "Invalid visibility '{}'. Must be one of: private, org, public",
                other
            ))),
        }
    }
}

/// Per-workspace settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub allow_member_invite: bool,
    pub require_approval_for_edits: bool,
    pub max_members: usize,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            allow_member_invite: true,
            require_approval_for_edits: true,
            max_members: 50,
        }
    }
}

impl WorkspaceSettings {
    pub fn with_max_members(mut self, max_members: usize) -> Self {
        self.max_members = max_members;
        self
    }
}

/// A user's membership in a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub invited_by: Option<UserId>,
}

/// A named group of members and attached DTUs (Entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
    members: Vec<Membership>,
    dtus: Vec<DtuId>,
    pub visibility: Visibility,
    pub settings: WorkspaceSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Create a workspace with `owner_id` as its sole, permanent owner.
    pub fn new(
        id: WorkspaceId,
        owner_id: UserId,
        name: impl Into<String>,
        description: impl Into<String>,
        visibility: Visibility,
        settings: WorkspaceSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let owner = Membership {
            user_id: owner_id.clone(),
            role: Role::Owner,
            joined_at: now,
            invited_by: None,
        };
        Self {
            id,
            name: name.into(),
            description: description.into(),
            owner_id,
            members: vec![owner],
            dtus: Vec::new(),
            visibility,
            settings,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn members(&self) -> &[Membership] {
        &self.members
    }

    pub fn dtus(&self) -> &[DtuId] {
        &self.dtus
    }

    pub fn member(&self, user_id: &UserId) -> Option<&Membership> {
        self.members.iter().find(|m| &m.user_id == user_id)
    }

    pub fn role_of(&self, user_id: &UserId) -> Option<Role> {
        self.member(user_id).map(|m| m.role)
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.settings.max_members
    }

    /// Append a membership, enforcing role, uniqueness and capacity.
    pub fn add_member(
        &mut self,
        user_id: UserId,
        role: Role,
        invited_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> CollabResult<&Membership> {
        if role == Role::Owner {
            return Err(CollabError::validation(
                "Role 'owner' is reserved for the workspace creator",
            ));
        }
        if self.member(&user_id).is_some() {
            return Err(CollabError::Conflict(format!(
                "User '{}' is already a member of workspace '{}'",
                user_id, self.id
            )));
        }
        if self.is_full() {
            return Err(CollabError::CapacityExceeded(format!(
                "Workspace '{}' has reached its limit of {} members",
                self.id, self.settings.max_members
            )));
        }

        self.members.push(Membership {
            user_id,
            role,
            joined_at: now,
            invited_by,
        });
        self.updated_at = now;
        Ok(&self.members[self.members.len() - 1])
    }

    /// Remove a membership. The owner can never be removed.
    pub fn remove_member(&mut self, user_id: &UserId, now: DateTime<Utc>) -> CollabResult<Membership> {
        let Some(index) = self.members.iter().position(|m| &m.user_id == user_id) else {
            return Err(CollabError::NotFound(format!(
                "User '{}' is not a member of workspace '{}'",
                user_id, self.id
            )));
        };
        if self.members[index].role == Role::Owner {
            return Err(CollabError::Forbidden(format!(
                "Cannot remove the owner of workspace '{}'",
                self.id
            )));
        }

        self.updated_at = now;
        Ok(self.members.remove(index))
    }

    /// Attach a DTU. Returns `false` when it was already attached.
    pub fn attach_dtu(&mut self, dtu_id: DtuId, now: DateTime<Utc>) -> bool {
        if self.dtus.contains(&dtu_id) {
            return false;
        }
        self.dtus.push(dtu_id);
        self.updated_at = now;
        true
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            owner_id: self.owner_id.clone(),
            members: self.members.clone(),
            member_count: self.members.len(),
            dtus: self.dtus.clone(),
            visibility: self.visibility,
            settings: self.settings.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-side view of a workspace with the DTU set materialized as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub id: WorkspaceId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
    pub members: Vec<Membership>,
    pub member_count: usize,
    pub dtus: Vec<DtuId>,
    pub visibility: Visibility,
    pub settings: WorkspaceSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A workspace annotated with the requesting user's role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    #[serde(flatten)]
    pub workspace: WorkspaceSnapshot,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(max_members: usize) -> Workspace {
        Workspace::new(
            WorkspaceId::new("ws-1"),
            UserId::new("u1"),
            "Research",
            "",
            Visibility::default(),
            WorkspaceSettings::default().with_max_members(max_members),
            Utc::now(),
        )
    }

    #[test]
    fn test_owner_is_sole_initial_member() {
        let ws = workspace(10);
        assert_eq!(ws.members().len(), 1);
        assert_eq!(ws.role_of(&UserId::new("u1")), Some(Role::Owner));
        assert_eq!(ws.snapshot().member_count, 1);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut ws = workspace(2);
        ws.add_member(UserId::new("u2"), Role::Editor, None, Utc::now())
            .unwrap();
        let err = ws
            .add_member(UserId::new("u3"), Role::Viewer, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CollabError::CapacityExceeded(_)));
        assert_eq!(ws.members().len(), 2);
    }

    #[test]
    fn test_duplicate_member_conflicts() {
        let mut ws = workspace(10);
        ws.add_member(UserId::new("u2"), Role::Editor, None, Utc::now())
            .unwrap();
        let err = ws
            .add_member(UserId::new("u2"), Role::Admin, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CollabError::Conflict(_)));
    }

    #[test]
    fn test_duplicate_check_precedes_capacity() {
        let mut ws = workspace(1);
        let err = ws
            .add_member(UserId::new("u1"), Role::Editor, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CollabError::Conflict(_)));
    }

    #[test]
    fn test_second_owner_is_rejected() {
        let mut ws = workspace(10);
        let err = ws
            .add_member(UserId::new("u2"), Role::Owner, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CollabError::Validation(_)));
    }

    #[test]
    fn test_owner_cannot_be_removed() {
        let mut ws = workspace(10);
        let err = ws.remove_member(&UserId::new("u1"), Utc::now()).unwrap_err();
        assert!(matches!(err, CollabError::Forbidden(_)));
        assert_eq!(ws.members().len(), 1);
    }

    #[test]
    fn test_remove_non_member_is_not_found() {
        let mut ws = workspace(10);
        let err = ws.remove_member(&UserId::new("ghost"), Utc::now()).unwrap_err();
        assert!(matches!(err, CollabError::NotFound(_)));
    }

    #[test]
    fn test_attach_dtu_is_idempotent() {
        let mut ws = workspace(10);
        assert!(ws.attach_dtu(DtuId::new("dtu-1"), Utc::now()));
        assert!(!ws.attach_dtu(DtuId::new("dtu-1"), Utc::now()));
        assert_eq!(ws.snapshot().dtus, vec![DtuId::new("dtu-1")]);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Editor".parse::<Role>().unwrap(), Role::Editor);
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn test_summary_flattens_workspace() {
        let ws = workspace(10);
        let summary = WorkspaceSummary {
            workspace: ws.snapshot(),
            role: Role::Owner,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "Research");
        assert_eq!(json["role"], "owner");
        assert_eq!(json["member_count"], 1);
    }
}
