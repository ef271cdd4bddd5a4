//! Revision proposal entity and its state machine
//!
//! ```text
//!            vote (approvals >= threshold)
//!  PENDING ─────────────────────────────────▶ APPROVED ──apply──▶ APPLIED
//!     │  │
//!     │  └──vote (rejections >= threshold)──▶ REJECTED
//!     │
//!     └──withdraw (proposer)────────────────▶ WITHDRAWN
//! ```
//!
//! `APPLIED`, `REJECTED` and `WITHDRAWN` are terminal. Votes are accepted
//! only while `PENDING`.

use super::rule::{Resolution, ResolutionRule};
use super::vote::{Vote, VoteChoice, VoteTally};
use crate::core::error::{CollabError, CollabResult};
use crate::core::ids::{DtuId, ProposalId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
    Applied,
    Withdrawn,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Applied | ProposalStatus::Rejected | ProposalStatus::Withdrawn
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "PENDING",
            ProposalStatus::Approved => "APPROVED",
            ProposalStatus::Rejected => "REJECTED",
            ProposalStatus::Applied => "APPLIED",
            ProposalStatus::Withdrawn => "WITHDRAWN",
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProposalStatus {
    type Err = CollabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(ProposalStatus::Pending),
            "APPROVED" => Ok(ProposalStatus::Approved),
            "REJECTED" => Ok(ProposalStatus::Rejected),
            "APPLIED" => Ok(ProposalStatus::Applied),
            "WITHDRAWN" => Ok(ProposalStatus::Withdrawn),
            other => Err(CollabError::validation(format!(
                "Invalid proposal status '{}'",
                other
            ))),
        }
    }
}

/// Who moved a proposal into a resolved state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolver {
    /// Resolved by reaching a vote threshold
    AutoThreshold,
    /// Resolved by an explicit user action (apply or withdraw)
    User(UserId),
}

impl std::fmt::Display for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolver::AutoThreshold => write!(f, "auto_threshold"),
            Resolver::User(id) => write!(f, "{}", id),
        }
    }
}

/// Partial set of DTU fields a proposal wants to change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl RevisionChanges {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }

    /// Names of the fields this change set touches
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.content.is_some() {
            fields.push("content");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        fields
    }
}

/// A formal request to change fields of a DTU, subject to peer votes (Entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionProposal {
    pub id: ProposalId,
    pub dtu_id: DtuId,
    pub proposer_id: UserId,
    pub changes: RevisionChanges,
    pub reason: Option<String>,
    pub status: ProposalStatus,
    pub votes: Vec<Vote>,
    pub rule: ResolutionRule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Resolver>,
    /// Set while an apply is in flight between validation and commit.
    #[serde(skip)]
    applying: bool,
}

impl RevisionProposal {
    /// Create a `PENDING` proposal. An empty change set is rejected.
    pub fn new(
        id: ProposalId,
        dtu_id: DtuId,
        proposer_id: UserId,
        changes: RevisionChanges,
        reason: Option<String>,
        rule: ResolutionRule,
        now: DateTime<Utc>,
    ) -> CollabResult<Self> {
        if changes.is_empty() {
            return Err(CollabError::validation(
                "A revision proposal must change at least one of title, content or tags",
            ));
        }
        Ok(Self {
            id,
            dtu_id,
            proposer_id,
            changes,
            reason,
            status: ProposalStatus::Pending,
            votes: Vec::new(),
            rule,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            resolved_by: None,
            applying: false,
        })
    }

    pub fn tally(&self) -> VoteTally {
        VoteTally::from_votes(&self.votes)
    }

    pub fn vote_of(&self, voter: &UserId) -> Option<&Vote> {
        self.votes.iter().find(|v| &v.voter_id == voter)
    }

    /// Record `voter`'s vote, replacing any earlier one, then re-evaluate.
    ///
    /// Returns the new status if this vote resolved the proposal.
    pub fn cast_vote(
        &mut self,
        voter: UserId,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> CollabResult<Option<ProposalStatus>> {
        if self.status != ProposalStatus::Pending {
            return Err(CollabError::state(format!(
                "Proposal '{}' is {} and no longer accepts votes",
                self.id, self.status
            )));
        }

        self.votes.retain(|v| v.voter_id != voter);
        self.votes.push(Vote::new(voter, choice, now));
        self.updated_at = now;

        let resolved = match self.rule.evaluate(&self.tally()) {
            Some(Resolution::Approved) => ProposalStatus::Approved,
            Some(Resolution::Rejected) => ProposalStatus::Rejected,
            None => return Ok(None),
        };
        self.status = resolved;
        self.resolved_at = Some(now);
        self.resolved_by = Some(Resolver::AutoThreshold);
        Ok(Some(resolved))
    }

    /// Claim the right to apply. Only one claim can be outstanding.
    pub fn begin_apply(&mut self) -> CollabResult<()> {
        if self.status != ProposalStatus::Approved {
            return Err(CollabError::state(format!(
                "Proposal '{}' is {}; only APPROVED proposals can be applied",
                self.id, self.status
            )));
        }
        if self.applying {
            return Err(CollabError::state(format!(
                "Proposal '{}' is already being applied",
                self.id
            )));
        }
        self.applying = true;
        Ok(())
    }

    /// Release a claim taken by [`begin_apply`](Self::begin_apply) without committing.
    pub fn abort_apply(&mut self) {
        self.applying = false;
    }

    /// Commit a claimed apply, moving to terminal `APPLIED`.
    pub fn complete_apply(&mut self, applied_by: UserId, now: DateTime<Utc>) -> CollabResult<()> {
        if !self.applying || self.status != ProposalStatus::Approved {
            return Err(CollabError::state(format!(
                "Proposal '{}' has no apply in progress",
                self.id
            )));
        }
        self.applying = false;
        self.status = ProposalStatus::Applied;
        self.resolved_at = Some(now);
        self.resolved_by = Some(Resolver::User(applied_by));
        self.updated_at = now;
        Ok(())
    }

    /// Withdraw a pending proposal. Only the proposer may withdraw.
    pub fn withdraw(&mut self, user: &UserId, now: DateTime<Utc>) -> CollabResult<()> {
        if user != &self.proposer_id {
            return Err(CollabError::Forbidden(format!(
                "Only the proposer can withdraw proposal '{}'",
                self.id
            )));
        }
        if self.status != ProposalStatus::Pending {
            return Err(CollabError::state(format!(
                "Proposal '{}' is {}; only PENDING proposals can be withdrawn",
                self.id, self.status
            )));
        }
        self.status = ProposalStatus::Withdrawn;
        self.resolved_at = Some(now);
        self.resolved_by = Some(Resolver::User(user.clone()));
        self.updated_at = now;
        Ok(())
    }
}
