//! Per-key locked in-memory storage
//!
//! [`KeyedStore`] keeps one `Mutex` per entity. The outer `RwLock` guards
//! only the key→entry map and is held just long enough to look up or insert
//! an entry; all entity work happens under that entity's own mutex, so
//! operations on unrelated keys never contend.
//!
//! Poisoned locks are recovered: every critical section validates before it
//! mutates, so a panic cannot leave an entity half-updated.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Lock a mutex, recovering from poisoning.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Map of independently locked entities.
pub struct KeyedStore<K, V> {
    entries: RwLock<HashMap<K, Arc<Mutex<V>>>>,
}

impl<K, V> Default for KeyedStore<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V> KeyedStore<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the entry for `key`, if present.
    pub fn get(&self, key: &K) -> Option<Arc<Mutex<V>>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// Insert a new entry, replacing any existing one.
    pub fn insert(&self, key: K, value: V) -> Arc<Mutex<V>> {
        let entry = Arc::new(Mutex::new(value));
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, Arc::clone(&entry));
        entry
    }

    /// Entry for `key`, creating it with `init` if absent.
    ///
    /// Creation is atomic: concurrent callers for the same key all receive
    /// the same entry.
    pub fn get_or_insert_with(&self, key: &K, init: impl FnOnce() -> V) -> Arc<Mutex<V>> {
        if let Some(entry) = self.get(key) {
            return entry;
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(init()))),
        )
    }

    /// Run `f` under the entry's lock.
    pub fn with<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let entry = self.get(key)?;
        let mut guard = lock(&entry);
        Some(f(&mut guard))
    }

    /// Handles to every entry, in no particular order.
    pub fn values(&self) -> Vec<Arc<Mutex<V>>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
