//! File-backed session store: one bincode-encoded snapshot per user key.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::SessionStore;
use crate::core::StoreError;
use crate::progress::Snapshot;

/// Stores each user's snapshot as `<dir>/<sanitized key>.quest`.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // User keys are emails or handles; keep the file name portable.
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.quest"))
    }
}

impl SessionStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Snapshot>, StoreError> {
        let bytes = match fs::read(self.path_for(key)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(bincode::deserialize(&bytes)?))
    }

    fn save(&mut self, key: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let bytes = bincode::serialize(snapshot)?;
        fs::write(self.path_for(key), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::scores::{BestScore, ScoreLedger};
    use crate::games::Difficulty;

    #[test]
    fn test_missing_user_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load("ghost@example.com").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());

        let mut snapshot = Snapshot::default();
        snapshot.progress.xp = 250;
        snapshot.progress.recompute_level();
        snapshot
            .scores
            .record(Difficulty::Hard, BestScore { time: 42, moves: 11 });

        store.save("player@example.com", &snapshot).unwrap();
        let loaded = store.load("player@example.com").unwrap().unwrap();

        assert_eq!(loaded.progress.xp, 250);
        assert_eq!(loaded.progress.level, 3);
        assert_eq!(
            loaded.scores.best(Difficulty::Hard),
            Some(BestScore { time: 42, moves: 11 })
        );
    }

    #[test]
    fn test_keys_are_sanitized_but_distinct_files_work() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());

        let a = Snapshot::default();
        let mut b = Snapshot::default();
        b.progress.games_won = 9;

        store.save("a@example.com", &a).unwrap();
        store.save("b@example.com", &b).unwrap();

        assert_eq!(store.load("a@example.com").unwrap().unwrap().progress.games_won, 0);
        assert_eq!(store.load("b@example.com").unwrap().unwrap().progress.games_won, 9);
    }
}
