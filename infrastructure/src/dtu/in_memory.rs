//! In-memory DTU store
//!
//! Backs the CLI and tests. Each DTU has its own lock, so applying a
//! revision to one record never blocks reads of another.

use collab_application::DtuStore;
use collab_application::store::{KeyedStore, lock};
use collab_domain::{Dtu, DtuId};
use tracing::debug;

#[derive(Default)]
pub struct InMemoryDtuStore {
    dtus: KeyedStore<DtuId, Dtu>,
}

impl InMemoryDtuStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `dtus`.
    pub fn seeded(dtus: impl IntoIterator<Item = Dtu>) -> Self {
        let store = Self::new();
        for dtu in dtus {
            store.insert(dtu);
        }
        store
    }

    /// Insert or replace a DTU.
    pub fn insert(&self, dtu: Dtu) {
        debug!("Seeding DTU {}", dtu.id);
        self.dtus.insert(dtu.id.clone(), dtu);
    }

    pub fn len(&self) -> usize {
        self.dtus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dtus.is_empty()
    }
}

impl DtuStore for InMemoryDtuStore {
    fn get(&self, id: &DtuId) -> Option<Dtu> {
        self.dtus.with(id, |dtu| dtu.clone())
    }

    fn mutate(&self, id: &DtuId, mutation: &mut dyn FnMut(&mut Dtu)) -> Option<Dtu> {
        let entry = self.dtus.get(id)?;
        let mut dtu = lock(&entry);
        mutation(&mut *dtu);
        Some(dtu.clone())
    }
}
