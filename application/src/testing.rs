//! Test doubles shared by the service tests

use crate::ports::audit_logger::{AuditEvent, AuditLogger};
use crate::ports::dtu_store::DtuStore;
use crate::store::lock;
use collab_domain::{Dtu, DtuId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Audit logger that keeps events in memory.
#[derive(Default)]
pub struct RecordingAuditLogger {
    events: Mutex<Vec<(&'static str, serde_json::Value)>>,
}

impl RecordingAuditLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(|(t, _)| *t).collect()
    }

    pub fn payloads(&self, event_type: &str) -> Vec<serde_json::Value> {
        lock(&self.events)
            .iter()
            .filter(|(t, _)| *t == event_type)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn last_payload(&self) -> Option<serde_json::Value> {
        lock(&self.events).last().map(|(_, p)| p.clone())
    }
}

impl AuditLogger for RecordingAuditLogger {
    fn log(&self, event: AuditEvent) {
        lock(&self.events).push((event.event_type, event.payload));
    }
}

/// Minimal DTU store backed by a single mutex.
#[derive(Default)]
pub struct MapDtuStore {
    dtus: Mutex<HashMap<DtuId, Dtu>>,
}

impl MapDtuStore {
    pub fn with(dtus: impl IntoIterator<Item = Dtu>) -> Self {
        Self {
            dtus: Mutex::new(dtus.into_iter().map(|d| (d.id.clone(), d)).collect()),
        }
    }
}

impl DtuStore for MapDtuStore {
    fn get(&self, id: &DtuId) -> Option<Dtu> {
        lock(&self.dtus).get(id).cloned()
    }

    fn mutate(&self, id: &DtuId, mutation: &mut dyn FnMut(&mut Dtu)) -> Option<Dtu> {
        let mut dtus = lock(&self.dtus);
        let dtu = dtus.get_mut(id)?;
        mutation(dtu);
        Some(dtu.clone())
    }
}
