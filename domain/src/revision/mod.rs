//! Revision proposal domain
//!
//! A revision proposal is the formal pathway for changing a DTU: peers vote
//! on it, the [`ResolutionRule`] decides it automatically once a threshold
//! is reached, and an approved proposal is applied as a single explicit
//! commit to the DTU store.

pub mod proposal;
pub mod rule;
pub mod vote;

pub use proposal::{ProposalStatus, Resolver, RevisionChanges, RevisionProposal};
pub use rule::{DEFAULT_VOTE_THRESHOLD, Resolution, ResolutionRule};
pub use vote::{Vote, VoteChoice, VoteTally};
