//! Auto-resolution rule for revision proposals
//!
//! A proposal resolves itself as soon as either count of live votes reaches
//! its threshold. Thresholds are absolute counts, independent of workspace
//! size.

use super::vote::VoteTally;
use crate::core::error::{CollabError, CollabResult};
use serde::{Deserialize, Serialize};

/// Default number of live votes that decides a proposal.
pub const DEFAULT_VOTE_THRESHOLD: usize = 3;

/// Outcome of evaluating a tally against a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Approved,
    Rejected,
}

/// Thresholds for automatic proposal resolution
///
/// # Example
///
/// ```
/// use collab_domain::revision::{ResolutionRule, Resolution, VoteTally};
///
/// let rule = ResolutionRule::default();
/// let tally = VoteTally { approvals: 3, rejections: 1 };
/// assert_eq!(rule.evaluate(&tally), Some(Resolution::Approved));
///
/// let tally = VoteTally { approvals: 2, rejections: 2 };
/// assert_eq!(rule.evaluate(&tally), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRule {
    pub approve_threshold: usize,
    pub reject_threshold: usize,
}

impl Default for ResolutionRule {
    fn default() -> Self {
        Self {
            approve_threshold: DEFAULT_VOTE_THRESHOLD,
            reject_threshold: DEFAULT_VOTE_THRESHOLD,
        }
    }
}

impl ResolutionRule {
    /// Create a rule. Both thresholds must be at least one.
    pub fn new(approve_threshold: usize, reject_threshold: usize) -> CollabResult<Self> {
        if approve_threshold == 0 || reject_threshold == 0 {
            return Err(CollabError::validation(
                "Vote thresholds must be at least 1",
            ));
        }
        Ok(Self {
            approve_threshold,
            reject_threshold,
        })
    }

    /// Same threshold for approval and rejection
    pub fn symmetric(threshold: usize) -> CollabResult<Self> {
        Self::new(threshold, threshold)
    }

    /// Approval is checked first; a single vote can only move one count,
    /// so both thresholds are never crossed by the same vote.
    pub fn evaluate(&self, tally: &VoteTally) -> Option<Resolution> {
        if tally.approvals >= self.approve_threshold {
            Some(Resolution::Approved)
        } else if tally.rejections >= self.reject_threshold {
            Some(Resolution::Rejected)
        } else {
            None
        }
    }

    /// Approvals still needed before the proposal is approved
    pub fn approvals_needed(&self, tally: &VoteTally) -> usize {
        self.approve_threshold.saturating_sub(tally.approvals)
    }

    pub fn description(&self) -> String {
        format!(
            "approve at {} votes, reject at {} votes",
            self.approve_threshold, self.reject_threshold
        )
    }
}

impl std::fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::str::FromStr for ResolutionRule {
    type Err = CollabError;

    /// Accepts `"N"` (symmetric) or `"N/M"` (approve N, reject M).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| -> CollabResult<usize> {
            part.trim().parse().map_err(|_| {
                CollabError::validation(format!(
                    "Invalid resolution rule '{}'. Expected N or N/M",
                    s
                ))
            })
        };
        match s.split_once('/') {
            Some((approve, reject)) => Self::new(parse(approve)?, parse(reject)?),
            None => Self::symmetric(parse(s)?),
        }
    }
}
