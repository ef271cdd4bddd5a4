//! Application layer for dtu-collab
//!
//! This crate contains the component services, port definitions, and
//! application configuration. It depends only on the domain layer.
//!
//! Every operation is synchronous and short. State lives in per-entity
//! locks so operations on different workspaces, threads, proposals or
//! sessions never contend.

pub mod collab_service;
pub mod config;
pub mod ports;
pub mod services;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use collab_service::{ApplyOutcome, CollabService, CollabServiceBuilder, ProposalView};
pub use config::{CollabConfig, CommentPolicy, ProposalPolicy};
pub use ports::{
    audit_logger::{AuditEvent, AuditLogger, NoAuditLogger},
    clock::{Clock, SystemClock},
    dtu_store::DtuStore,
};
pub use services::{
    CommentListing, CommentQuery, CommentThreadStore, CreateWorkspaceInput,
    EditSessionCoordinator, MembershipIndex, RevisionProposalEngine, ServiceContext,
    StartSessionOutput, WorkspaceRegistry,
};
