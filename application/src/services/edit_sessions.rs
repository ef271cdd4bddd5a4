//! Edit session coordinator
//!
//! At most one active session exists per DTU. Each DTU gets a slot guarded
//! by its own lock; `start` checks for an active session and creates or
//! joins under that lock, so two users starting at once end up in the same
//! session. Audit events are emitted under the slot lock, so a session's
//! events are logged in the order they happened.
//!
//! Ending a session keeps it in the slot (readable through `get`) until the
//! next `start` replaces it with a fresh one.

use super::ServiceContext;
use crate::store::{KeyedStore, lock};
use collab_domain::{
    CollabError, CollabResult, DtuId, Edit, EditSession, SessionId, UserId,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

/// Result of [`EditSessionCoordinator::start`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartSessionOutput {
    pub session: EditSession,
    /// `true` if the caller joined an already active session
    pub joined: bool,
}

pub struct EditSessionCoordinator {
    slots: KeyedStore<DtuId, Option<EditSession>>,
    ctx: ServiceContext,
}

impl EditSessionCoordinator {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            slots: KeyedStore::new(),
            ctx,
        }
    }

    /// Join the DTU's active session, or open a new one.
    pub fn start(&self, dtu_id: &DtuId, user: &UserId) -> StartSessionOutput {
        let entry = self.slots.get_or_insert_with(dtu_id, || None);
        let now = self.ctx.now();

        let mut slot = lock(&entry);
        let output = match slot.as_mut() {
            Some(session) if session.active => {
                session.join(user.clone(), now);
                StartSessionOutput {
                    session: session.clone(),
                    joined: true,
                }
            }
            _ => {
                let session =
                    EditSession::start(SessionId::generate(), dtu_id.clone(), user.clone(), now);
                *slot = Some(session.clone());
                StartSessionOutput {
                    session,
                    joined: false,
                }
            }
        };

        if output.joined {
            info!(
                "User {} joined edit session {} on DTU {} ({} participants)",
                user,
                output.session.id,
                dtu_id,
                output.session.participants().len()
            );
        } else {
            info!(
                "Edit session {} started on DTU {} by {}",
                output.session.id, dtu_id, user
            );
        }
        self.ctx.audit(
            "edit_session_started",
            json!({
                "session_id": output.session.id,
                "dtu_id": dtu_id,
                "user_id": user,
                "joined": output.joined,
            }),
        );
        output
    }

    /// Append to the active session's edit log.
    pub fn record(
        &self,
        dtu_id: &DtuId,
        user: &UserId,
        field: &str,
        old_value: Value,
        new_value: Value,
    ) -> CollabResult<Edit> {
        let no_session = || {
            CollabError::state(format!("No active edit session on DTU '{}'", dtu_id))
        };
        let entry = self.slots.get(dtu_id).ok_or_else(no_session)?;
        let mut slot = lock(&entry);
        let session = slot.as_mut().filter(|s| s.active).ok_or_else(no_session)?;
        let edit = session
            .record(user.clone(), field, old_value, new_value, self.ctx.now())?
            .clone();

        debug!("Edit #{} on DTU {} field {} by {}", edit.seq, dtu_id, field, user);
        self.ctx.audit(
            "edit_recorded",
            json!({
                "dtu_id": dtu_id,
                "editor_id": user,
                "field": field,
                "seq": edit.seq,
            }),
        );
        Ok(edit)
    }

    /// End the DTU's session. Ending an already ended session is a no-op.
    pub fn end(&self, dtu_id: &DtuId) -> CollabResult<EditSession> {
        self.slots
            .with(dtu_id, |slot| {
                slot.as_mut().map(|session| {
                    if session.end(self.ctx.now()) {
                        info!(
                            "Edit session {} on DTU {} ended after {} edits",
                            session.id,
                            dtu_id,
                            session.edits().len()
                        );
                        self.ctx.audit(
                            "edit_session_ended",
                            json!({
                                "session_id": session.id,
                                "dtu_id": dtu_id,
                                "edits": session.edits().len(),
                            }),
                        );
                    }
                    session.clone()
                })
            })
            .flatten()
            .ok_or_else(|| CollabError::not_found("edit session for DTU", dtu_id))
    }

    /// Current session for the DTU: the active one, or the last ended one.
    pub fn get(&self, dtu_id: &DtuId) -> CollabResult<EditSession> {
        self.slots
            .with(dtu_id, |slot| slot.clone())
            .flatten()
            .ok_or_else(|| CollabError::not_found("edit session for DTU", dtu_id))
    }

    /// Participants of the active session on the DTU, if one is active.
    pub fn active_participants(&self, dtu_id: &DtuId) -> Option<Vec<UserId>> {
        self.slots
            .with(dtu_id, |slot| {
                slot.as_ref()
                    .filter(|s| s.active)
                    .map(|s| s.participants().to_vec())
            })
            .flatten()
    }

    /// Other users' edits of `field` after log position `after_seq`.
    pub fn conflicting_edits(
        &self,
        dtu_id: &DtuId,
        user: &UserId,
        field: &str,
        after_seq: u64,
    ) -> CollabResult<Vec<Edit>> {
        self.slots
            .with(dtu_id, |slot| {
                slot.as_ref().map(|s| {
                    s.conflicting_edits(user, field, after_seq)
                        .into_iter()
                        .cloned()
                        .collect()
                })
            })
            .flatten()
            .ok_or_else(|| CollabError::not_found("edit session for DTU", dtu_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> EditSessionCoordinator {
        EditSessionCoordinator::new(ServiceContext::default())
    }

    #[test]
    fn test_start_join_end_restart_scenario() {
        let c = coordinator();
        let dtu = DtuId::new("dtu-2");

        let first = c.start(&dtu, &UserId::new("u1"));
        assert!(!first.joined);

        let second = c.start(&dtu, &UserId::new("u2"));
        assert!(second.joined);
        assert_eq!(second.session.id, first.session.id);
        assert_eq!(
            second.session.participants(),
            &[UserId::new("u1"), UserId::new("u2")]
        );

        let ended = c.end(&dtu).unwrap();
        assert!(!ended.active);
        assert!(ended.ended_at.is_some());

        let third = c.start(&dtu, &UserId::new("u3"));
        assert!(!third.joined);
        assert_ne!(third.session.id, first.session.id);
        assert_eq!(third.session.participants(), &[UserId::new("u3")]);
    }

    #[test]
    fn test_rejoin_is_idempotent() {
        let c = coordinator();
        let dtu = DtuId::new("d");
        c.start(&dtu, &UserId::new("u1"));
        let again = c.start(&dtu, &UserId::new("u1"));
        assert!(again.joined);
        assert_eq!(again.session.participants().len(), 1);
    }

    #[test]
    fn test_record_requires_active_session() {
        let c = coordinator();
        let dtu = DtuId::new("d");
        let err = c
            .record(&dtu, &UserId::new("u1"), "title", json!("a"), json!("b"))
            .unwrap_err();
        assert!(matches!(err, CollabError::StateError(_)));

        c.start(&dtu, &UserId::new("u1"));
        let edit = c
            .record(&dtu, &UserId::new("u1"), "title", json!("a"), json!("b"))
            .unwrap();
        assert_eq!(edit.seq, 1);

        c.end(&dtu).unwrap();
        let err = c
            .record(&dtu, &UserId::new("u1"), "title", json!("b"), json!("c"))
            .unwrap_err();
        assert!(matches!(err, CollabError::StateError(_)));
    }

    #[test]
    fn test_end_and_get_unknown_session() {
        let c = coordinator();
        let dtu = DtuId::new("none");
        assert!(matches!(c.end(&dtu), Err(CollabError::NotFound(_))));
        assert!(matches!(c.get(&dtu), Err(CollabError::NotFound(_))));
        assert!(c.active_participants(&dtu).is_none());
    }

    #[test]
    fn test_end_twice_keeps_first_end_time() {
        let c = coordinator();
        let dtu = DtuId::new("d");
        c.start(&dtu, &UserId::new("u1"));
        let first = c.end(&dtu).unwrap();
        let second = c.end(&dtu).unwrap();
        assert_eq!(first.ended_at, second.ended_at);
    }

    #[test]
    fn test_conflict_visibility() {
        let c = coordinator();
        let dtu = DtuId::new("d");
        c.start(&dtu, &UserId::new("u1"));
        c.start(&dtu, &UserId::new("u2"));
        let mine = c
            .record(&dtu, &UserId::new("u1"), "title", json!("a"), json!("b"))
            .unwrap();
        c.record(&dtu, &UserId::new("u2"), "title", json!("b"), json!("c"))
            .unwrap();

        let conflicts = c
            .conflicting_edits(&dtu, &UserId::new("u1"), "title", mine.seq)
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].new_value, json!("c"));
        assert_eq!(
            c.active_participants(&dtu),
            Some(vec![UserId::new("u1"), UserId::new("u2")])
        );
    }
}
