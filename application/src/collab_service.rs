//! Collaboration service facade
//!
//! [`CollabService`] is the single entry point an API layer calls. It is an
//! explicitly constructed object: build one at startup, inject the DTU
//! store (and optionally a clock and an audit logger), and share it behind
//! an `Arc`. There is no process-wide state.

use crate::config::CollabConfig;
use crate::ports::audit_logger::{AuditLogger, NoAuditLogger};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::dtu_store::DtuStore;
use crate::services::{
    CommentListing, CommentQuery, CommentThreadStore, CreateWorkspaceInput,
    EditSessionCoordinator, RevisionProposalEngine, ServiceContext, StartSessionOutput,
    WorkspaceRegistry,
};
use collab_domain::{
    CollabError, CollabResult, Comment, CommentId, Dtu, DtuId, Edit, EditSession, Membership,
    ProposalId, ProposalStatus, RevisionChanges, RevisionProposal, Role, UserId, VoteChoice,
    VoteTally, WorkspaceId, WorkspaceSnapshot, WorkspaceSummary,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Result of [`CollabService::apply_revision`]
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub proposal: RevisionProposal,
    pub dtu: Dtu,
    /// Participants of a live edit session that was active on the DTU when
    /// the revision was applied. Their in-flight edits may now be stale.
    pub concurrent_edit_session: Option<Vec<UserId>>,
}

/// A proposal together with its live vote counts
#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    #[serde(flatten)]
    pub proposal: RevisionProposal,
    pub tally: VoteTally,
}

impl From<RevisionProposal> for ProposalView {
    fn from(proposal: RevisionProposal) -> Self {
        let tally = proposal.tally();
        Self { proposal, tally }
    }
}

/// Builder for [`CollabService`]
pub struct CollabServiceBuilder {
    dtu_store: Arc<dyn DtuStore>,
    config: CollabConfig,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLogger>,
}

impl CollabServiceBuilder {
    pub fn with_config(mut self, config: CollabConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn build(self) -> CollabService {
        let ctx = ServiceContext::new(self.clock, self.audit);
        CollabService {
            workspaces: WorkspaceRegistry::new(
                self.config.workspace_defaults().clone(),
                ctx.clone(),
            )
            .with_default_visibility(self.config.default_visibility()),
            comments: CommentThreadStore::new(self.config.comments().clone(), ctx.clone()),
            proposals: RevisionProposalEngine::new(
                self.dtu_store,
                self.config.proposals().rule,
                ctx.clone(),
            ),
            sessions: EditSessionCoordinator::new(ctx),
            config: self.config,
        }
    }
}

/// The collaborative revision and concurrent-editing engine
pub struct CollabService {
    workspaces: WorkspaceRegistry,
    comments: CommentThreadStore,
    proposals: RevisionProposalEngine,
    sessions: EditSessionCoordinator,
    config: CollabConfig,
}

impl CollabService {
    pub fn builder(dtu_store: Arc<dyn DtuStore>) -> CollabServiceBuilder {
        CollabServiceBuilder {
            dtu_store,
            config: CollabConfig::default(),
            clock: Arc::new(SystemClock),
            audit: Arc::new(NoAuditLogger),
        }
    }

    pub fn new(config: CollabConfig, dtu_store: Arc<dyn DtuStore>) -> Self {
        Self::builder(dtu_store).with_config(config).build()
    }

    pub fn config(&self) -> &CollabConfig {
        &self.config
    }

    // ==================== Workspaces ====================

    pub fn create_workspace(&self, input: CreateWorkspaceInput) -> WorkspaceSnapshot {
        self.workspaces.create(input)
    }

    pub fn get_workspace(&self, id: &WorkspaceId) -> CollabResult<WorkspaceSnapshot> {
        self.workspaces.get(id)
    }

    pub fn list_workspaces(&self, user: &UserId) -> Vec<WorkspaceSummary> {
        self.workspaces.list_for_user(user)
    }

    pub fn get_workspace_role(
        &self,
        id: &WorkspaceId,
        user: &UserId,
    ) -> CollabResult<Option<Role>> {
        self.workspaces.role_of(id, user)
    }

    pub fn add_workspace_member(
        &self,
        id: &WorkspaceId,
        user: &UserId,
        role: Role,
        invited_by: Option<&UserId>,
    ) -> CollabResult<Membership> {
        self.workspaces
            .add_member(id, user.clone(), role, invited_by.cloned())
    }

    pub fn remove_workspace_member(
        &self,
        id: &WorkspaceId,
        user: &UserId,
    ) -> CollabResult<Membership> {
        self.workspaces.remove_member(id, user)
    }

    pub fn add_dtu_to_workspace(&self, id: &WorkspaceId, dtu_id: &DtuId) -> CollabResult<bool> {
        self.workspaces.add_dtu(id, dtu_id.clone())
    }

    // ==================== Comments ====================

    pub fn add_comment(
        &self,
        dtu_id: &DtuId,
        user: &UserId,
        text: impl Into<String>,
        parent_id: Option<&CommentId>,
    ) -> CollabResult<Comment> {
        self.comments.add(dtu_id, user, text, parent_id.cloned())
    }

    pub fn get_comments(&self, dtu_id: &DtuId, query: CommentQuery) -> CommentListing {
        self.comments.list(dtu_id, query)
    }

    pub fn edit_comment(
        &self,
        comment_id: &CommentId,
        user: &UserId,
        new_text: impl Into<String>,
    ) -> CollabResult<Comment> {
        self.comments.edit(comment_id, user, new_text)
    }

    pub fn resolve_comment(&self, comment_id: &CommentId) -> CollabResult<Comment> {
        self.comments.resolve(comment_id)
    }

    pub fn react_to_comment(
        &self,
        comment_id: &CommentId,
        user: &UserId,
        emoji: &str,
    ) -> CollabResult<Comment> {
        self.comments.react(comment_id, user, emoji)
    }

    // ==================== Revision proposals ====================

    pub fn propose_revision(
        &self,
        dtu_id: &DtuId,
        user: &UserId,
        changes: RevisionChanges,
        reason: Option<String>,
    ) -> CollabResult<RevisionProposal> {
        self.proposals.propose(dtu_id, user, changes, reason)
    }

    pub fn vote_on_revision(
        &self,
        id: &ProposalId,
        user: &UserId,
        vote: VoteChoice,
    ) -> CollabResult<RevisionProposal> {
        self.proposals.vote(id, user, vote)
    }

    pub fn get_revision_proposals(
        &self,
        dtu_id: &DtuId,
        status: Option<ProposalStatus>,
    ) -> Vec<RevisionProposal> {
        self.proposals.list_for_dtu(dtu_id, status)
    }

    pub fn get_revision_proposal(&self, id: &ProposalId) -> CollabResult<ProposalView> {
        self.proposals.get(id).map(ProposalView::from)
    }

    /// Apply an approved proposal to its DTU.
    ///
    /// A live edit session on the same DTU is reported in the outcome (and
    /// logged), or refused with `StateError` when the proposal policy blocks
    /// applies during edit sessions.
    pub fn apply_revision(
        &self,
        id: &ProposalId,
        applied_by: &UserId,
    ) -> CollabResult<ApplyOutcome> {
        let dtu_id = self.proposals.get(id)?.dtu_id;
        let concurrent = self.sessions.active_participants(&dtu_id);

        if let Some(participants) = &concurrent
            && self.config.proposals().block_apply_during_edit_session
        {
            return Err(CollabError::state(format!(
                "DTU '{}' has an active edit session with {} participant(s); end it before applying",
                dtu_id,
                participants.len()
            )));
        }

        let (proposal, dtu) = self.proposals.apply(id, applied_by)?;

        if let Some(participants) = &concurrent {
            warn!(
                "Proposal {} applied to DTU {} while an edit session with {} participant(s) is active",
                id,
                dtu_id,
                participants.len()
            );
        }
        Ok(ApplyOutcome {
            proposal,
            dtu,
            concurrent_edit_session: concurrent,
        })
    }

    pub fn withdraw_revision(
        &self,
        id: &ProposalId,
        user: &UserId,
    ) -> CollabResult<RevisionProposal> {
        self.proposals.withdraw(id, user)
    }

    // ==================== Edit sessions ====================

    pub fn start_edit_session(&self, dtu_id: &DtuId, user: &UserId) -> StartSessionOutput {
        self.sessions.start(dtu_id, user)
    }

    pub fn record_edit(
        &self,
        dtu_id: &DtuId,
        user: &UserId,
        field: &str,
        old_value: Value,
        new_value: Value,
    ) -> CollabResult<Edit> {
        self.sessions
            .record(dtu_id, user, field, old_value, new_value)
    }

    pub fn end_edit_session(&self, dtu_id: &DtuId) -> CollabResult<EditSession> {
        self.sessions.end(dtu_id)
    }

    pub fn get_edit_session(&self, dtu_id: &DtuId) -> CollabResult<EditSession> {
        self.sessions.get(dtu_id)
    }

    pub fn get_conflicting_edits(
        &self,
        dtu_id: &DtuId,
        user: &UserId,
        field: &str,
        after_seq: u64,
    ) -> CollabResult<Vec<Edit>> {
        self.sessions
            .conflicting_edits(dtu_id, user, field, after_seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::dtu_store::DtuStore as _;
    use crate::testing::{MapDtuStore, RecordingAuditLogger};
    use chrono::Utc;
    use collab_domain::{Resolver, WorkspaceSettings};
    use serde_json::json;

    fn service_with(config: CollabConfig) -> (CollabService, Arc<MapDtuStore>) {
        let store = Arc::new(MapDtuStore::with([
            Dtu::new("dtu-1", "Old title", Utc::now()).with_tags(["draft"]),
            Dtu::new("dtu-2", "Second", Utc::now()),
        ]));
        let service = CollabService::new(config, store.clone());
        (service, store)
    }

    fn service() -> (CollabService, Arc<MapDtuStore>) {
        service_with(CollabConfig::default())
    }

    fn u(id: &str) -> UserId {
        UserId::new(id)
    }

    #[test]
    fn test_workspace_capacity_scenario() {
        let (service, _) = service();
        let ws = service.create_workspace(
            CreateWorkspaceInput::new("u1", "Research")
                .with_settings(WorkspaceSettings::default().with_max_members(2)),
        );

        service
            .add_workspace_member(&ws.id, &u("u2"), Role::Editor, Some(&u("u1")))
            .unwrap();
        let err = service
            .add_workspace_member(&ws.id, &u("u3"), Role::Viewer, None)
            .unwrap_err();
        assert_eq!(err.code(), "capacity_exceeded");
        assert_eq!(
            service.get_workspace_role(&ws.id, &u("u2")).unwrap(),
            Some(Role::Editor)
        );
    }

    #[test]
    fn test_propose_vote_apply_scenario() {
        let (service, store) = service();
        let dtu = DtuId::new("dtu-1");

        let p = service
            .propose_revision(&dtu, &u("u1"), RevisionChanges::default().title("New"), None)
            .unwrap();
        for voter in ["u2", "u3"] {
            let voted = service
                .vote_on_revision(&p.id, &u(voter), VoteChoice::Approve)
                .unwrap();
            assert_eq!(voted.status, ProposalStatus::Pending);
        }
        let approved = service
            .vote_on_revision(&p.id, &u("u4"), VoteChoice::Approve)
            .unwrap();
        assert_eq!(approved.status, ProposalStatus::Approved);
        assert_eq!(approved.resolved_by.unwrap().to_string(), "auto_threshold");

        let outcome = service.apply_revision(&p.id, &u("u5")).unwrap();
        assert_eq!(outcome.dtu.title, "New");
        assert_eq!(outcome.dtu.tags, vec!["draft".to_string()]);
        assert_eq!(outcome.proposal.status, ProposalStatus::Applied);
        assert_eq!(outcome.proposal.resolved_by, Some(Resolver::User(u("u5"))));
        assert!(outcome.concurrent_edit_session.is_none());

        assert_eq!(store.get(&dtu).unwrap().title, "New");
    }

    #[test]
    fn test_proposal_view_carries_tally() {
        let (service, _) = service();
        let p = service
            .propose_revision(
                &DtuId::new("dtu-1"),
                &u("u1"),
                RevisionChanges::default().content("x"),
                Some("typo".into()),
            )
            .unwrap();
        service
            .vote_on_revision(&p.id, &u("u2"), VoteChoice::Approve)
            .unwrap();
        service
            .vote_on_revision(&p.id, &u("u3"), VoteChoice::Reject)
            .unwrap();

        let view = service.get_revision_proposal(&p.id).unwrap();
        assert_eq!(view.tally.approvals, 1);
        assert_eq!(view.tally.rejections, 1);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["tally"]["approvals"], 1);
    }

    fn approved_proposal(service: &CollabService, dtu: &DtuId) -> ProposalId {
        let p = service
            .propose_revision(dtu, &u("u1"), RevisionChanges::default().title("T"), None)
            .unwrap();
        for voter in ["u2", "u3", "u4"] {
            service
                .vote_on_revision(&p.id, &u(voter), VoteChoice::Approve)
                .unwrap();
        }
        p.id
    }

    #[test]
    fn test_apply_during_edit_session_is_reported() {
        let (service, _) = service();
        let dtu = DtuId::new("dtu-2");
        let id = approved_proposal(&service, &dtu);
        service.start_edit_session(&dtu, &u("u7"));

        let outcome = service.apply_revision(&id, &u("u5")).unwrap();
        assert_eq!(outcome.concurrent_edit_session, Some(vec![u("u7")]));
    }

    #[test]
    fn test_apply_during_edit_session_can_be_blocked() {
        let (service, _) =
            service_with(CollabConfig::default().with_block_apply_during_edit_session(true));
        let dtu = DtuId::new("dtu-2");
        let id = approved_proposal(&service, &dtu);
        service.start_edit_session(&dtu, &u("u7"));

        let err = service.apply_revision(&id, &u("u5")).unwrap_err();
        assert!(matches!(err, CollabError::StateError(_)));
        assert_eq!(
            service.get_revision_proposal(&id).unwrap().proposal.status,
            ProposalStatus::Approved
        );

        service.end_edit_session(&dtu).unwrap();
        assert!(service.apply_revision(&id, &u("u5")).is_ok());
    }

    #[test]
    fn test_edit_session_scenario() {
        let (service, _) = service();
        let dtu = DtuId::new("dtu-2");

        assert!(!service.start_edit_session(&dtu, &u("u1")).joined);
        let second = service.start_edit_session(&dtu, &u("u2"));
        assert!(second.joined);
        assert_eq!(second.session.participants(), &[u("u1"), u("u2")]);

        service
            .record_edit(&dtu, &u("u2"), "title", json!("Second"), json!("2nd"))
            .unwrap();
        let conflicts = service
            .get_conflicting_edits(&dtu, &u("u1"), "title", 0)
            .unwrap();
        assert_eq!(conflicts.len(), 1);

        service.end_edit_session(&dtu).unwrap();
        let fresh = service.start_edit_session(&dtu, &u("u3"));
        assert!(!fresh.joined);
        assert!(fresh.session.edits().is_empty());
        assert_eq!(service.get_edit_session(&dtu).unwrap().id, fresh.session.id);
    }

    #[test]
    fn test_comment_scenario() {
        let (service, _) = service();
        let dtu = DtuId::new("dtu-1");
        let root = service
            .add_comment(&dtu, &u("u2"), "Looks good", None)
            .unwrap();
        service
            .add_comment(&dtu, &u("u3"), "+1", Some(&root.id))
            .unwrap();

        let listing = service.get_comments(&dtu, CommentQuery::tree());
        assert_eq!(listing.len(), 1);
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json[0]["text"], "Looks good");
        assert_eq!(json[0]["replies"][0]["text"], "+1");
    }

    #[test]
    fn test_builder_injects_audit_logger() {
        let audit = Arc::new(RecordingAuditLogger::default());
        let service = CollabService::builder(Arc::new(MapDtuStore::default()))
            .with_audit_logger(audit.clone())
            .build();

        let dtu = DtuId::new("dtu-9");
        let p = service
            .propose_revision(&dtu, &u("u1"), RevisionChanges::default().title("x"), None)
            .unwrap();
        service.withdraw_revision(&p.id, &u("u1")).unwrap();

        assert_eq!(
            audit.event_types(),
            vec!["revision_proposed", "revision_withdrawn"]
        );
        assert_eq!(audit.last_payload().unwrap()["user_id"], "u1");
    }

    // ==================== Concurrency ====================

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_votes_resolve_exactly_once() {
        let (service, _) = service();
        let service = Arc::new(service);
        let p = service
            .propose_revision(
                &DtuId::new("dtu-1"),
                &u("u1"),
                RevisionChanges::default().title("race"),
                None,
            )
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let service = Arc::clone(&service);
            let id = p.id.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                service.vote_on_revision(&id, &u(&format!("voter-{}", i)), VoteChoice::Approve)
            }));
        }

        let mut accepted = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(CollabError::StateError(_)) => refused += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let view = service.get_revision_proposal(&p.id).unwrap();
        assert_eq!(view.proposal.status, ProposalStatus::Approved);
        assert_eq!(accepted, 3);
        assert_eq!(refused, 29);
        assert_eq!(view.tally.approvals, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_joins_never_exceed_capacity() {
        let (service, _) = service();
        let service = Arc::new(service);
        let ws = service.create_workspace(
            CreateWorkspaceInput::new("owner", "Busy")
                .with_settings(WorkspaceSettings::default().with_max_members(5)),
        );

        let mut handles = Vec::new();
        for i in 0..40 {
            let service = Arc::clone(&service);
            let id = ws.id.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                service.add_workspace_member(&id, &u(&format!("m{}", i)), Role::Viewer, None)
            }));
        }
        let mut joined = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                joined += 1;
            }
        }

        assert_eq!(joined, 4);
        assert_eq!(service.get_workspace(&ws.id).unwrap().member_count, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_session_starts_share_one_session() {
        let (service, _) = service();
        let service = Arc::new(service);
        let dtu = DtuId::new("dtu-2");

        let mut handles = Vec::new();
        for i in 0..16 {
            let service = Arc::clone(&service);
            let dtu = dtu.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                service.start_edit_session(&dtu, &u(&format!("e{}", i)))
            }));
        }
        let mut fresh = 0;
        for handle in handles {
            if !handle.await.unwrap().joined {
                fresh += 1;
            }
        }

        assert_eq!(fresh, 1);
        let session = service.get_edit_session(&dtu).unwrap();
        assert!(session.active);
        assert_eq!(session.participants().len(), 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_applies_commit_once() {
        let (service, _) = service();
        let service = Arc::new(service);
        let id = approved_proposal(&service, &DtuId::new("dtu-1"));

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = Arc::clone(&service);
            let id = id.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                service.apply_revision(&id, &u(&format!("a{}", i)))
            }));
        }
        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
    }
}
