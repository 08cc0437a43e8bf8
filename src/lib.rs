//! # proquest
//!
//! A progression engine that gates task completion behind winning short,
//! deterministic mini-games.
//!
//! ## Design Principles
//!
//! 1. **Engine-Owned State**: one [`ProgressionEngine`] owns one user's
//!    [`UserProgress`] per session. There is no ambient global; every
//!    operation is an explicit method call.
//!
//! 2. **Explicit Derivation**: level and achievement unlocks are re-derived
//!    synchronously at the end of every mutating operation. No watchers, no
//!    hidden dependency graph.
//!
//! 3. **Deterministic Games**: all randomness flows through a seeded,
//!    forkable [`GameRng`]; all time flows through an injectable [`Clock`].
//!    A session replays identically from a seed and a clock.
//!
//! 4. **Uniform Game Contract**: every mini-game is a state machine driven
//!    by discrete [`GameEvent`]s that ends in at most one terminal
//!    [`Outcome`] and supports cancellation that silences any still-queued
//!    deferred transition.
//!
//! ## Modules
//!
//! - `core`: errors, deterministic RNG, injectable time
//! - `games`: the game contract, the grid game, the matching game, the
//!   opponent decision policy
//! - `progress`: tasks, the per-user progress value, achievements, the
//!   progression engine
//! - `store`: session snapshot stores and the best-score ledger
//!
//! ## Flow
//!
//! A host asks the engine to complete a task; the engine suspends the
//! completion into a pending challenge and hands back a fresh game instance.
//! The host drives the game to its terminal outcome. On a win the engine
//! commits the completion: xp, level, streak, daily counter, achievements,
//! persistence. On anything else, nothing changes.

pub mod core;
pub mod games;
pub mod progress;
pub mod store;

// Re-export commonly used types
pub use crate::core::{Clock, FixedClock, GameRng, QuestError, StoreError, SystemClock};

pub use crate::games::{
    BuiltinGames, Difficulty, GameEngine, GameEvent, GameFactory, GameKind, MemoryGame, Outcome,
    OutcomeSink, TicTacToe,
};

pub use crate::progress::{
    Achievement, AchievementDef, PendingChallenge, Priority, ProgressionEngine, Snapshot, Task,
    TaskId, UserProgress, DEFINITIONS,
};

pub use crate::store::{
    BestScore, BestScoreBook, FileStore, MemoryStore, ScoreLedger, SessionStore,
};
