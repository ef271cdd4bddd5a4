//! Revision proposal engine
//!
//! Proposals are locked individually. Vote casting (drop the voter's old
//! vote, append the new one, re-tally, maybe transition) runs entirely under
//! the proposal's lock, so concurrent voters always see the latest tally.
//!
//! Applying is the only point where the engine touches the external DTU
//! store, and the proposal lock is never held across that call:
//!
//! 1. under the proposal lock: require `APPROVED`, claim the apply
//! 2. without it: mutate the DTU through [`DtuStore::mutate`]
//! 3. under the proposal lock again: commit `APPLIED` (or release the claim
//!    if the DTU was missing)
//!
//! The claim makes a second concurrent `apply` fail with `StateError`, so a
//! DTU is mutated at most once per proposal.
//!
//! Audit events are emitted while the proposal lock is held, so a proposal's
//! events reach the audit log in the order they were applied.

use super::ServiceContext;
use crate::ports::dtu_store::DtuStore;
use crate::store::{KeyedStore, lock};
use collab_domain::{
    CollabError, CollabResult, Dtu, DtuId, ProposalId, ProposalStatus, ResolutionRule,
    RevisionChanges, RevisionProposal, UserId, VoteChoice,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info};

pub struct RevisionProposalEngine {
    proposals: KeyedStore<ProposalId, RevisionProposal>,
    by_dtu: RwLock<HashMap<DtuId, Vec<ProposalId>>>,
    dtu_store: Arc<dyn DtuStore>,
    rule: ResolutionRule,
    ctx: ServiceContext,
}

impl RevisionProposalEngine {
    pub fn new(dtu_store: Arc<dyn DtuStore>, rule: ResolutionRule, ctx: ServiceContext) -> Self {
        Self {
            proposals: KeyedStore::new(),
            by_dtu: RwLock::new(HashMap::new()),
            dtu_store,
            rule,
            ctx,
        }
    }

    pub fn propose(
        &self,
        dtu_id: &DtuId,
        proposer: &UserId,
        changes: RevisionChanges,
        reason: Option<String>,
    ) -> CollabResult<RevisionProposal> {
        let proposal = RevisionProposal::new(
            ProposalId::generate(),
            dtu_id.clone(),
            proposer.clone(),
            changes,
            reason,
            self.rule,
            self.ctx.now(),
        )?;

        self.proposals.insert(proposal.id.clone(), proposal.clone());
        self.by_dtu
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(dtu_id.clone())
            .or_default()
            .push(proposal.id.clone());

        info!(
            "Proposal {} opened on DTU {} by {} ({})",
            proposal.id,
            dtu_id,
            proposer,
            proposal.changes.fields().join(", ")
        );
        self.ctx.audit(
            "revision_proposed",
            json!({
                "proposal_id": proposal.id,
                "dtu_id": dtu_id,
                "proposer_id": proposer,
                "fields": proposal.changes.fields(),
            }),
        );
        Ok(proposal)
    }

    /// Cast or replace `voter`'s vote and auto-resolve if a threshold is met.
    pub fn vote(
        &self,
        id: &ProposalId,
        voter: &UserId,
        choice: VoteChoice,
    ) -> CollabResult<RevisionProposal> {
        let entry = self.entry(id)?;
        let mut proposal = lock(&entry);
        let resolved = proposal.cast_vote(voter.clone(), choice, self.ctx.now())?;

        let tally = proposal.tally();
        debug!(
            "Vote {} on {} by {}: {} approve / {} reject",
            choice, id, voter, tally.approvals, tally.rejections
        );
        self.ctx.audit(
            "revision_vote",
            json!({ "proposal_id": id, "voter_id": voter, "vote": choice }),
        );

        if let Some(status) = resolved {
            info!(
                "Proposal {} auto-resolved to {} {}",
                id,
                status,
                tally.summary()
            );
            self.ctx.audit(
                "revision_resolved",
                json!({
                    "proposal_id": id,
                    "status": status,
                    "resolved_by": "auto_threshold",
                    "approvals": tally.approvals,
                    "rejections": tally.rejections,
                }),
            );
        }
        Ok(proposal.clone())
    }

    pub fn get(&self, id: &ProposalId) -> CollabResult<RevisionProposal> {
        self.proposals
            .with(id, |p| p.clone())
            .ok_or_else(|| CollabError::not_found("proposal", id))
    }

    /// Proposals for a DTU, newest first, optionally filtered by status.
    pub fn list_for_dtu(
        &self,
        dtu_id: &DtuId,
        status: Option<ProposalStatus>,
    ) -> Vec<RevisionProposal> {
        let ids = self
            .by_dtu
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dtu_id)
            .cloned()
            .unwrap_or_default();

        let mut proposals: Vec<RevisionProposal> = ids
            .iter()
            .rev()
            .filter_map(|id| self.proposals.with(id, |p| p.clone()))
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect();
        // Stable: equal timestamps keep newest-submitted first.
        proposals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        proposals
    }

    /// Apply an approved proposal to its DTU.
    pub fn apply(
        &self,
        id: &ProposalId,
        applied_by: &UserId,
    ) -> CollabResult<(RevisionProposal, Dtu)> {
        let entry = self.entry(id)?;

        let (dtu_id, changes) = {
            let mut proposal = lock(&entry);
            proposal.begin_apply()?;
            (proposal.dtu_id.clone(), proposal.changes.clone())
        };

        let now = self.ctx.now();
        let updated = self
            .dtu_store
            .mutate(&dtu_id, &mut |dtu: &mut Dtu| dtu.apply_changes(&changes, now));

        let Some(dtu) = updated else {
            lock(&entry).abort_apply();
            return Err(CollabError::not_found("DTU", &dtu_id));
        };

        let mut proposal = lock(&entry);
        proposal.complete_apply(applied_by.clone(), now)?;

        info!("Proposal {} applied to DTU {} by {}", id, dtu_id, applied_by);
        self.ctx.audit(
            "revision_applied",
            json!({
                "proposal_id": id,
                "dtu_id": dtu_id,
                "applied_by": applied_by,
                "fields": changes.fields(),
            }),
        );
        Ok((proposal.clone(), dtu))
    }

    pub fn withdraw(&self, id: &ProposalId, user: &UserId) -> CollabResult<RevisionProposal> {
        let entry = self.entry(id)?;
        let mut proposal = lock(&entry);
        proposal.withdraw(user, self.ctx.now())?;

        info!("Proposal {} withdrawn by {}", id, user);
        self.ctx.audit(
            "revision_withdrawn",
            json!({ "proposal_id": id, "user_id": user }),
        );
        Ok(proposal.clone())
    }

    fn entry(&self, id: &ProposalId) -> CollabResult<Arc<Mutex<RevisionProposal>>> {
        self.proposals
            .get(id)
            .ok_or_else(|| CollabError::not_found("proposal", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::SystemClock;
    use crate::testing::{MapDtuStore, RecordingAuditLogger};
    use chrono::Utc;
    use collab_domain::Resolver;

    fn engine_with(dtus: Vec<Dtu>) -> RevisionProposalEngine {
        RevisionProposalEngine::new(
            Arc::new(MapDtuStore::with(dtus)),
            ResolutionRule::default(),
            ServiceContext::default(),
        )
    }

    fn engine() -> RevisionProposalEngine {
        engine_with(vec![
            Dtu::new("dtu-1", "Old", Utc::now()).with_content("body"),
        ])
    }

    fn approve_all(engine: &RevisionProposalEngine, id: &ProposalId, voters: &[&str]) {
        for voter in voters {
            engine
                .vote(id, &UserId::new(*voter), VoteChoice::Approve)
                .unwrap();
        }
    }

    #[test]
    fn test_propose_requires_changes() {
        let err = engine()
            .propose(
                &DtuId::new("dtu-1"),
                &UserId::new("u1"),
                RevisionChanges::default(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, CollabError::Validation(_)));
    }

    #[test]
    fn test_approve_and_apply_scenario() {
        let engine = engine();
        let p = engine
            .propose(
                &DtuId::new("dtu-1"),
                &UserId::new("u1"),
                RevisionChanges::default().title("New"),
                Some("clearer".into()),
            )
            .unwrap();
        assert_eq!(p.status, ProposalStatus::Pending);

        approve_all(&engine, &p.id, &["u2", "u3"]);
        assert_eq!(engine.get(&p.id).unwrap().status, ProposalStatus::Pending);

        let resolved = engine
            .vote(&p.id, &UserId::new("u4"), VoteChoice::Approve)
            .unwrap();
        assert_eq!(resolved.status, ProposalStatus::Approved);
        assert_eq!(resolved.resolved_by, Some(Resolver::AutoThreshold));

        let (applied, dtu) = engine.apply(&p.id, &UserId::new("u5")).unwrap();
        assert_eq!(dtu.title, "New");
        assert_eq!(dtu.content, "body");
        assert_eq!(applied.status, ProposalStatus::Applied);
        assert_eq!(applied.resolved_by, Some(Resolver::User(UserId::new("u5"))));

        let err = engine.apply(&p.id, &UserId::new("u5")).unwrap_err();
        assert!(matches!(err, CollabError::StateError(_)));
    }

    #[test]
    fn test_apply_non_approved_is_state_error() {
        let engine = engine();
        let p = engine
            .propose(
                &DtuId::new("dtu-1"),
                &UserId::new("u1"),
                RevisionChanges::default().content("x"),
                None,
            )
            .unwrap();
        assert!(matches!(
            engine.apply(&p.id, &UserId::new("u1")),
            Err(CollabError::StateError(_))
        ));

        for voter in ["u2", "u3", "u4"] {
            engine
                .vote(&p.id, &UserId::new(voter), VoteChoice::Reject)
                .unwrap();
        }
        assert_eq!(engine.get(&p.id).unwrap().status, ProposalStatus::Rejected);
        assert!(matches!(
            engine.apply(&p.id, &UserId::new("u1")),
            Err(CollabError::StateError(_))
        ));
    }

    #[test]
    fn test_apply_missing_dtu_keeps_proposal_approved() {
        let engine = engine();
        let p = engine
            .propose(
                &DtuId::new("ghost"),
                &UserId::new("u1"),
                RevisionChanges::default().title("t"),
                None,
            )
            .unwrap();
        approve_all(&engine, &p.id, &["u2", "u3", "u4"]);

        let err = engine.apply(&p.id, &UserId::new("u5")).unwrap_err();
        assert!(matches!(err, CollabError::NotFound(_)));
        assert_eq!(engine.get(&p.id).unwrap().status, ProposalStatus::Approved);
        // The claim was released, so a retry reaches the store again.
        assert!(matches!(
            engine.apply(&p.id, &UserId::new("u5")),
            Err(CollabError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_proposal() {
        let engine = engine();
        let id = ProposalId::new("missing");
        assert!(matches!(
            engine.vote(&id, &UserId::new("u1"), VoteChoice::Approve),
            Err(CollabError::NotFound(_))
        ));
        assert!(matches!(engine.get(&id), Err(CollabError::NotFound(_))));
        assert!(matches!(
            engine.apply(&id, &UserId::new("u1")),
            Err(CollabError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_newest_first_with_filter() {
        let engine = engine();
        let dtu = DtuId::new("dtu-1");
        let first = engine
            .propose(&dtu, &UserId::new("u1"), RevisionChanges::default().title("a"), None)
            .unwrap();
        let second = engine
            .propose(&dtu, &UserId::new("u2"), RevisionChanges::default().title("b"), None)
            .unwrap();
        engine.withdraw(&first.id, &UserId::new("u1")).unwrap();

        let all = engine.list_for_dtu(&dtu, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);

        let pending = engine.list_for_dtu(&dtu, Some(ProposalStatus::Pending));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);

        assert!(engine.list_for_dtu(&DtuId::new("other"), None).is_empty());
    }

    #[test]
    fn test_rule_is_snapshotted_per_proposal() {
        let engine = RevisionProposalEngine::new(
            Arc::new(MapDtuStore::default()),
            ResolutionRule::new(1, 1).unwrap(),
            ServiceContext::default(),
        );
        let p = engine
            .propose(&DtuId::new("d"), &UserId::new("u1"), RevisionChanges::default().tags(["x"]), None)
            .unwrap();
        assert_eq!(p.rule, ResolutionRule::new(1, 1).unwrap());
        let voted = engine
            .vote(&p.id, &UserId::new("u2"), VoteChoice::Approve)
            .unwrap();
        assert_eq!(voted.status, ProposalStatus::Approved);
    }

    #[test]
    fn test_vote_audit_order_matches_vote_order() {
        let audit = Arc::new(RecordingAuditLogger::default());
        let engine = RevisionProposalEngine::new(
            Arc::new(MapDtuStore::default()),
            ResolutionRule::new(100, 100).unwrap(),
            ServiceContext::new(Arc::new(SystemClock), audit.clone()),
        );
        let proposal = engine
            .propose(
                &DtuId::new("dtu-1"),
                &UserId::new("u0"),
                RevisionChanges::default().title("New"),
                None,
            )
            .unwrap();

        std::thread::scope(|scope| {
            for i in 0..24 {
                let engine = &engine;
                let id = &proposal.id;
                scope.spawn(move || {
                    engine
                        .vote(id, &UserId::new(format!("voter-{}", i)), VoteChoice::Approve)
                        .unwrap();
                });
            }
        });

        let recorded: Vec<String> = audit
            .payloads("revision_vote")
            .iter()
            .map(|p| p["voter_id"].as_str().unwrap().to_string())
            .collect();
        let applied: Vec<String> = engine
            .get(&proposal.id)
            .unwrap()
            .votes
            .iter()
            .map(|v| v.voter_id.as_str().to_string())
            .collect();
        assert_eq!(recorded.len(), 24);
        assert_eq!(recorded, applied);
    }
}
