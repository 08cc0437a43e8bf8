//! Session persistence: the store contract and the provided backends.
//!
//! The progression engine loads one [`Snapshot`] per user at session start
//! and saves after every committed mutation. Saving is best-effort: a failed
//! save is logged by the engine and never rolls back in-memory state.

pub mod file;
pub mod memory;
pub mod scores;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use scores::{BestScore, BestScoreBook, ScoreLedger};

use crate::core::StoreError;
use crate::progress::Snapshot;

/// Durable storage for per-user session snapshots.
pub trait SessionStore {
    /// Load the snapshot for a user key, `None` for an unknown user.
    fn load(&self, key: &str) -> Result<Option<Snapshot>, StoreError>;

    /// Persist the snapshot for a user key.
    fn save(&mut self, key: &str, snapshot: &Snapshot) -> Result<(), StoreError>;
}
