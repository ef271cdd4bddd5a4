//! Application-level configuration.
//!
//! - [`CollabConfig`]: container for the per-component policies
//! - [`ProposalPolicy`]: vote thresholds and apply behavior
//! - [`CommentPolicy`]: comment length, listing and reply depth limits

pub mod collab_config;

pub use collab_config::{CollabConfig, CommentPolicy, ProposalPolicy};
