//! Collaboration services
//!
//! One service per component, leaves first:
//!
//! 1. [`WorkspaceRegistry`] with its [`MembershipIndex`]
//! 2. [`CommentThreadStore`]
//! 3. [`RevisionProposalEngine`]
//! 4. [`EditSessionCoordinator`]
//!
//! [`CollabService`](crate::CollabService) composes them behind one API.

pub mod comment_threads;
pub mod edit_sessions;
pub mod membership_index;
pub mod revision_proposals;
pub mod workspace_registry;

pub use comment_threads::{CommentListing, CommentQuery, CommentThreadStore};
pub use edit_sessions::{EditSessionCoordinator, StartSessionOutput};
pub use membership_index::MembershipIndex;
pub use revision_proposals::RevisionProposalEngine;
pub use workspace_registry::{CreateWorkspaceInput, WorkspaceRegistry};

use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared collaborators injected into every service
#[derive(Clone)]
pub struct ServiceContext {
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLogger>,
}

impl ServiceContext {
    pub fn new(clock: Arc<dyn Clock>, audit: Arc<dyn AuditLogger>) -> Self {
        Self { clock, audit }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn audit(&self, event_type: &'static str, payload: serde_json::Value) {
        self.audit.log(AuditEvent::new(event_type, payload));
    }
}

impl Default for ServiceContext {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(NoAuditLogger))
    }
}
