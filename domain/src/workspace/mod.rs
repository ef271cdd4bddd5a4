//! Workspace domain
//!
//! A workspace groups members and attached DTUs under shared visibility and
//! edit settings. The roster invariants live on [`Workspace`] itself:
//!
//! - member count never exceeds `settings.max_members`
//! - exactly one member holds [`Role::Owner`], and it can never be removed
//! - a user appears in the roster at most once

pub mod entities;

pub use entities::{
    Membership, Role, Visibility, Workspace, WorkspaceSettings, WorkspaceSnapshot,
    WorkspaceSummary,
};
