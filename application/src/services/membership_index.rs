//! Reverse index from user to the workspaces they belong to
//!
//! Kept in lockstep with workspace rosters by [`WorkspaceRegistry`]: every
//! roster change updates the index while the workspace's lock is still
//! held, so a roster and its index entry never disagree for longer than
//! one critical section.
//!
//! [`WorkspaceRegistry`]: super::WorkspaceRegistry

use collab_domain::{UserId, WorkspaceId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
pub struct MembershipIndex {
    by_user: RwLock<HashMap<UserId, Vec<WorkspaceId>>>,
}

impl MembershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `user` belongs to `workspace`. Idempotent.
    pub fn add(&self, user: &UserId, workspace: &WorkspaceId) {
        let mut by_user = self.by_user.write().unwrap_or_else(PoisonError::into_inner);
        let workspaces = by_user.entry(user.clone()).or_default();
        if !workspaces.contains(workspace) {
            workspaces.push(workspace.clone());
        }
    }

    pub fn remove(&self, user: &UserId, workspace: &WorkspaceId) {
        let mut by_user = self.by_user.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(workspaces) = by_user.get_mut(user) {
            workspaces.retain(|w| w != workspace);
            if workspaces.is_empty() {
                by_user.remove(user);
            }
        }
    }

    /// Workspaces `user` belongs to, in join order.
    pub fn workspaces_of(&self, user: &UserId) -> Vec<WorkspaceId> {
        let by_user = self.by_user.read().unwrap_or_else(PoisonError::into_inner);
        by_user.get(user).cloned().unwrap_or_default()
    }

    pub fn contains(&self, user: &UserId, workspace: &WorkspaceId) -> bool {
        let by_user = self.by_user.read().unwrap_or_else(PoisonError::into_inner);
        by_user
            .get(user)
            .is_some_and(|workspaces| workspaces.contains(workspace))
    }
}
