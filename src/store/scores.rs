//! Per-difficulty best scores for the matching game.
//!
//! Tracked per user and persisted with the session snapshot. Best time and
//! best moves improve independently: the fastest run and the most economical
//! run need not be the same one.

use serde::{Deserialize, Serialize};

use crate::games::Difficulty;

/// A best run for one difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestScore {
    /// Seconds from round start to the last match.
    pub time: u32,
    /// Resolved card pairs over the whole round.
    pub moves: u32,
}

/// Read/write access to the best-score table, keyed by difficulty tier.
pub trait ScoreLedger {
    /// The recorded best for a tier, if any run finished there.
    fn best(&self, difficulty: Difficulty) -> Option<BestScore>;

    /// Offer a finished run. Fields only ever improve; returns whether
    /// anything changed.
    fn record(&mut self, difficulty: Difficulty, entry: BestScore) -> bool;
}

/// The default in-memory ledger, one slot per tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestScoreBook {
    easy: Option<BestScore>,
    medium: Option<BestScore>,
    hard: Option<BestScore>,
}

impl BestScoreBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, difficulty: Difficulty) -> &mut Option<BestScore> {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

impl ScoreLedger for BestScoreBook {
    fn best(&self, difficulty: Difficulty) -> Option<BestScore> {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    fn record(&mut self, difficulty: Difficulty, entry: BestScore) -> bool {
        let slot = self.slot_mut(difficulty);
        match slot {
            None => {
                *slot = Some(entry);
                true
            }
            Some(best) => {
                let mut improved = false;
                if entry.time < best.time {
                    best.time = entry.time;
                    improved = true;
                }
                if entry.moves < best.moves {
                    best.moves = entry.moves;
                    improved = true;
                }
                improved
            }
        }
    }
}
