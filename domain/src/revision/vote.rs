//! Vote types for revision proposals
//!
//! This module defines the voting primitives used when peers review a
//! proposed change to a DTU.

use crate::core::error::CollabError;
use crate::core::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A voter's position on a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Approve,
    Reject,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Approve => "approve",
            VoteChoice::Reject => "reject",
        }
    }
}

impl std::fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VoteChoice {
    type Err = CollabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" => Ok(VoteChoice::Approve),
            "reject" => Ok(VoteChoice::Reject),
            other => Err(CollabError::validation(format!(
                "Invalid vote '{}'. Must be 'approve' or 'reject'",
                other
            ))),
        }
    }
}

/// A single live vote on a proposal
///
/// # Example
///
/// ```
/// use collab_domain::revision::{Vote, VoteChoice};
///
/// let vote = Vote::approve("u2");
/// assert_eq!(vote.choice, VoteChoice::Approve);
/// assert!(vote.is_approval());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: UserId,
    pub choice: VoteChoice,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(voter_id: impl Into<UserId>, choice: VoteChoice, cast_at: DateTime<Utc>) -> Self {
        Self {
            voter_id: voter_id.into(),
            choice,
            cast_at,
        }
    }

    /// Create an approval vote cast now
    pub fn approve(voter_id: impl Into<UserId>) -> Self {
        Self::new(voter_id, VoteChoice::Approve, Utc::now())
    }

    /// Create a rejection vote cast now
    pub fn reject(voter_id: impl Into<UserId>) -> Self {
        Self::new(voter_id, VoteChoice::Reject, Utc::now())
    }

    pub fn is_approval(&self) -> bool {
        self.choice == VoteChoice::Approve
    }
}

/// Counts of live votes on a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub approvals: usize,
    pub rejections: usize,
}

impl VoteTally {
    pub fn from_votes(votes: &[Vote]) -> Self {
        let approvals = votes.iter().filter(|v| v.is_approval()).count();
        Self {
            approvals,
            rejections: votes.len() - approvals,
        }
    }

    pub fn total(&self) -> usize {
        self.approvals + self.rejections
    }

    /// Get the approval ratio (0.0 to 1.0)
    pub fn approval_ratio(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.approvals as f64 / self.total() as f64
        }
    }

    /// Visual summary, e.g. "[●●○]"
    pub fn summary(&self) -> String {
        let mut summary = String::from("[");
        summary.extend(std::iter::repeat_n('●', self.approvals));
        summary.extend(std::iter::repeat_n('○', self.rejections));
        summary.push(']');
        summary
    }
}
