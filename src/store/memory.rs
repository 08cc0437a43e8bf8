//! In-memory session store.

use rustc_hash::FxHashMap;

use super::SessionStore;
use crate::core::StoreError;
use crate::progress::Snapshot;

/// Keeps snapshots in a map. The default backend for tests and for hosts
/// that bring their own durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, Snapshot>,
    saves: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saves accepted over this store's lifetime.
    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.saves
    }

    /// Direct read access, for host-side inspection.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Snapshot> {
        self.entries.get(key)
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), snapshot.clone());
        self.saves += 1;
        Ok(())
    }
}
