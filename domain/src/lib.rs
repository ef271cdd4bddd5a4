//! Domain layer for dtu-collab
//!
//! This crate contains the entities, value objects and invariants of the
//! collaborative revision engine. It has no dependencies on locking,
//! storage or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Workspace
//!
//! A named roster of members (exactly one owner, bounded size) and a set of
//! attached DTUs.
//!
//! ## Comment Thread
//!
//! Append-only discussion per DTU, with replies, reactions, resolution and
//! edit history.
//!
//! ## Revision Proposal
//!
//! A formal change request that peers vote on. One live vote per voter;
//! the [`ResolutionRule`] decides the proposal once a threshold is reached.
//!
//! ## Edit Session
//!
//! Informal live co-editing marker with an ordered edit log for conflict
//! visibility.

pub mod comment;
pub mod config;
pub mod core;
pub mod dtu;
pub mod edit;
pub mod revision;
pub mod workspace;

// Re-export commonly used types
pub use comment::{
    Comment, CommentEdit, CommentNode, CommentThread, DEFAULT_COMMENT_LIMIT, MAX_COMMENT_LENGTH,
    MAX_REPLY_DEPTH, validate_comment_text,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{
    error::{CollabError, CollabResult, Failure},
    ids::{CommentId, DtuId, ProposalId, SessionId, UserId, WorkspaceId},
};
pub use dtu::Dtu;
pub use edit::{Edit, EditSession};
pub use revision::{
    DEFAULT_VOTE_THRESHOLD, ProposalStatus, Resolution, ResolutionRule, Resolver,
    RevisionChanges, RevisionProposal, Vote, VoteChoice, VoteTally,
};
pub use workspace::{
    Membership, Role, Visibility, Workspace, WorkspaceSettings, WorkspaceSnapshot,
    WorkspaceSummary,
};
