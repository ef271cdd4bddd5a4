//! Edit session entities

use crate::core::error::{CollabError, CollabResult};
use crate::core::ids::{DtuId, SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in a session's edit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    /// Position in the session log, starting at 1
    pub seq: u64,
    pub editor_id: UserId,
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub at: DateTime<Utc>,
}

/// A live co-editing marker on a DTU (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditSession {
    pub id: SessionId,
    pub dtu_id: DtuId,
    pub started_by: UserId,
    participants: Vec<UserId>,
    pub active: bool,
    edits: Vec<Edit>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl EditSession {
    pub fn start(id: SessionId, dtu_id: DtuId, started_by: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            dtu_id,
            participants: vec![started_by.clone()],
            started_by,
            active: true,
            edits: Vec::new(),
            started_at: now,
            last_activity: now,
            ended_at: None,
        }
    }

    pub fn participants(&self) -> &[UserId] {
        &self.participants
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn is_participant(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    /// Add a participant. Returns `false` if already present.
    pub fn join(&mut self, user: UserId, now: DateTime<Utc>) -> bool {
        if self.is_participant(&user) {
            return false;
        }
        self.participants.push(user);
        self.last_activity = self.last_activity.max(now);
        true
    }

    /// Append an edit to the log. Fails once the session has ended.
    pub fn record(
        &mut self,
        editor_id: UserId,
        field: impl Into<String>,
        old_value: Value,
        new_value: Value,
        now: DateTime<Utc>,
    ) -> CollabResult<&Edit> {
        if !self.active {
            return Err(CollabError::state(format!(
                "Edit session '{}' on DTU '{}' has ended",
                self.id, self.dtu_id
            )));
        }
        let field = field.into();
        if field.trim().is_empty() {
            return Err(CollabError::validation("Edited field name cannot be empty"));
        }

        let at = self.last_activity.max(now);
        self.edits.push(Edit {
            seq: self.edits.len() as u64 + 1,
            editor_id,
            field,
            old_value,
            new_value,
            at,
        });
        self.last_activity = at;
        Ok(&self.edits[self.edits.len() - 1])
    }

    /// Mark the session ended. Returns `false` if it already was.
    pub fn end(&mut self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        let at = self.last_activity.max(now);
        self.ended_at = Some(at);
        self.last_activity = at;
        true
    }

    /// Edits recorded after log position `after_seq`
    pub fn edits_since(&self, after_seq: u64) -> &[Edit] {
        let start = (after_seq as usize).min(self.edits.len());
        &self.edits[start..]
    }

    /// Edits of `field` by anyone other than `user` after log position `after_seq`.
    ///
    /// This is what surfaces "someone else also changed `title` after your
    /// last read".
    pub fn conflicting_edits(&self, user: &UserId, field: &str, after_seq: u64) -> Vec<&Edit> {
        self.edits_since(after_seq)
            .iter()
            .filter(|e| e.field == field && &e.editor_id != user)
            .collect()
    }
}
