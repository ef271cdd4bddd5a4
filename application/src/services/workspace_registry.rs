//! Workspace registry
//!
//! Owns workspace records and keeps the [`MembershipIndex`] in step with
//! every roster change. Each workspace has its own lock, so the capacity
//! check and the append in `add_member` are atomic per workspace while
//! unrelated workspaces proceed in parallel. Audit events are emitted under
//! the same lock, in roster order.

use super::ServiceContext;
use super::membership_index::MembershipIndex;
use crate::store::{KeyedStore, lock};
use collab_domain::{
    CollabError, CollabResult, DtuId, Membership, Role, UserId, Visibility, Workspace,
    WorkspaceId, WorkspaceSettings, WorkspaceSnapshot, WorkspaceSummary,
};
use serde_json::json;
use tracing::{debug, info};

/// Input for creating a workspace
#[derive(Debug, Clone)]
pub struct CreateWorkspaceInput {
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    pub settings: Option<WorkspaceSettings>,
}

impl CreateWorkspaceInput {
    pub fn new(owner_id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: name.into(),
            description: None,
            visibility: None,
            settings: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_settings(mut self, settings: WorkspaceSettings) -> Self {
        self.settings = Some(settings);
        self
    }
}

pub struct WorkspaceRegistry {
    workspaces: KeyedStore<WorkspaceId, Workspace>,
    index: MembershipIndex,
    defaults: WorkspaceSettings,
    default_visibility: Visibility,
    ctx: ServiceContext,
}

impl WorkspaceRegistry {
    pub fn new(defaults: WorkspaceSettings, ctx: ServiceContext) -> Self {
        Self {
            workspaces: KeyedStore::new(),
            index: MembershipIndex::new(),
            defaults,
            default_visibility: Visibility::default(),
            ctx,
        }
    }

    /// Visibility for workspaces created without one.
    pub fn with_default_visibility(mut self, visibility: Visibility) -> Self {
        self.default_visibility = visibility;
        self
    }

    /// Create a workspace with the owner as sole member.
    pub fn create(&self, input: CreateWorkspaceInput) -> WorkspaceSnapshot {
        let mut settings = input.settings.unwrap_or_else(|| self.defaults.clone());
        // The owner always occupies one seat.
        settings.max_members = settings.max_members.max(1);

        let id = WorkspaceId::generate();
        let workspace = Workspace::new(
            id.clone(),
            input.owner_id.clone(),
            input.name,
            input.description.unwrap_or_default(),
            input.visibility.unwrap_or(self.default_visibility),
            settings,
            self.ctx.now(),
        );
        let snapshot = workspace.snapshot();

        let entry = self.workspaces.insert(id.clone(), workspace);
        let _guard = lock(&entry);
        self.index.add(&input.owner_id, &id);

        info!("Workspace {} created by {}", id, input.owner_id);
        self.ctx.audit(
            "workspace_created",
            json!({
                "workspace_id": id,
                "owner_id": input.owner_id,
                "name": snapshot.name,
            }),
        );
        snapshot
    }

    pub fn get(&self, id: &WorkspaceId) -> CollabResult<WorkspaceSnapshot> {
        self.workspaces
            .with(id, |ws| ws.snapshot())
            .ok_or_else(|| CollabError::not_found("workspace", id))
    }

    /// Workspaces `user` belongs to, each annotated with the user's role.
    ///
    /// Walks the reverse index, so cost scales with the user's memberships.
    pub fn list_for_user(&self, user: &UserId) -> Vec<WorkspaceSummary> {
        let ids = self.index.workspaces_of(user);
        debug!("Listing {} workspaces for {}", ids.len(), user);

        ids.iter()
            .filter_map(|id| {
                self.workspaces
                    .with(id, |ws| {
                        ws.role_of(user).map(|role| WorkspaceSummary {
                            workspace: ws.snapshot(),
                            role,
                        })
                    })
                    .flatten()
            })
            .collect()
    }

    pub fn role_of(&self, id: &WorkspaceId, user: &UserId) -> CollabResult<Option<Role>> {
        self.workspaces
            .with(id, |ws| ws.role_of(user))
            .ok_or_else(|| CollabError::not_found("workspace", id))
    }

    pub fn add_member(
        &self,
        id: &WorkspaceId,
        user: UserId,
        role: Role,
        invited_by: Option<UserId>,
    ) -> CollabResult<Membership> {
        let entry = self
            .workspaces
            .get(id)
            .ok_or_else(|| CollabError::not_found("workspace", id))?;

        let mut ws = lock(&entry);
        let membership = ws
            .add_member(user.clone(), role, invited_by, self.ctx.now())?
            .clone();
        self.index.add(&user, id);

        info!("User {} joined workspace {} as {}", user, id, role);
        self.ctx.audit(
            "workspace_member_added",
            json!({
                "workspace_id": id,
                "user_id": user,
                "role": role,
                "invited_by": membership.invited_by,
            }),
        );
        Ok(membership)
    }

    pub fn remove_member(&self, id: &WorkspaceId, user: &UserId) -> CollabResult<Membership> {
        let entry = self
            .workspaces
            .get(id)
            .ok_or_else(|| CollabError::not_found("workspace", id))?;

        let mut ws = lock(&entry);
        let removed = ws.remove_member(user, self.ctx.now())?;
        self.index.remove(user, id);

        info!("User {} removed from workspace {}", user, id);
        self.ctx.audit(
            "workspace_member_removed",
            json!({ "workspace_id": id, "user_id": user }),
        );
        Ok(removed)
    }

    /// Attach a DTU. Returns `true` if it was newly attached.
    pub fn add_dtu(&self, id: &WorkspaceId, dtu_id: DtuId) -> CollabResult<bool> {
        let now = self.ctx.now();
        self.workspaces
            .with(id, |ws| {
                let attached = ws.attach_dtu(dtu_id.clone(), now);
                if attached {
                    debug!("DTU {} attached to workspace {}", dtu_id, id);
                    self.ctx.audit(
                        "workspace_dtu_added",
                        json!({ "workspace_id": id, "dtu_id": dtu_id }),
                    );
                }
                attached
            })
            .ok_or_else(|| CollabError::not_found("workspace", id))
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}
