//! Mini-game engines and the contract that gates task completion.
//!
//! A game instance is constructed fresh per challenge attempt and ends in
//! exactly one terminal outcome, [`Outcome::Win`] or [`Outcome::NotWin`].
//! Hosts drive every variant through the same surface: discrete
//! [`GameEvent`]s in, at most one outcome out. `cancel` tears an instance
//! down; after it, no event mutates state and no outcome is ever reported,
//! even if a deferred `Tick`/`Resolve` was already scheduled by the host.
//!
//! Two variants live in this crate ([`tictactoe::TicTacToe`] and
//! [`memory::MemoryGame`]); the other selectable kinds are supplied by hosts
//! through their own [`GameFactory`].

pub mod memory;
pub mod policy;
pub mod tictactoe;

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::GameRng;
use crate::store::scores::ScoreLedger;

pub use memory::MemoryGame;
pub use tictactoe::TicTacToe;

/// Difficulty tier, configured per game instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Number of symbol pairs on the matching board.
    #[must_use]
    pub const fn pair_count(self) -> usize {
        match self {
            Self::Easy => 4,
            Self::Medium => 6,
            Self::Hard => 8,
        }
    }

    /// Countdown length for the matching game, in seconds.
    #[must_use]
    pub const fn match_time(self) -> u32 {
        match self {
            Self::Easy => 120,
            Self::Medium => 90,
            Self::Hard => 60,
        }
    }
}

/// The selectable mini-games.
///
/// `TicTacToe` and `Memory` are implemented here; `Snake` and `Chess` are
/// host-supplied variants satisfying the same [`GameEngine`] contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    TicTacToe,
    Snake,
    Memory,
    Chess,
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TicTacToe => "tic-tac-toe",
            Self::Snake => "snake",
            Self::Memory => "memory",
            Self::Chess => "chess",
        };
        write!(f, "{name}")
    }
}

/// Terminal outcome of a game instance.
///
/// Loss, tie and timeout all collapse to `NotWin`: only a win commits the
/// gated task completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    NotWin,
}

/// Discrete input event fed to a game instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// (Re)start a round. Ignored once a terminal outcome was reported.
    Start,
    /// Click on a cell or card.
    Select(usize),
    /// One second of host clock.
    Tick,
    /// A host-scheduled deferred transition: the opponent's reply in the
    /// grid game, pair resolution in the matching game.
    Resolve,
}

/// Callback fired when an instance reaches its terminal outcome.
pub type OutcomeSink = Box<dyn FnOnce(Outcome)>;

/// Uniform surface implemented by every mini-game variant.
pub trait GameEngine {
    fn kind(&self) -> GameKind;

    /// Feed one input event. Illegal or stale input is a no-op.
    fn handle(&mut self, event: GameEvent);

    /// The terminal outcome, once reached. `None` while the game is live or
    /// after cancellation.
    fn outcome(&self) -> Option<Outcome>;

    /// Tear the instance down. No outcome is reported after this, and all
    /// further events are no-ops.
    fn cancel(&mut self);
}

/// Constructs game instances for challenge attempts.
///
/// Returns `None` for kinds the factory does not provide, letting hosts
/// layer their own variants over [`BuiltinGames`].
pub trait GameFactory {
    fn create(
        &self,
        kind: GameKind,
        difficulty: Difficulty,
        rng: GameRng,
    ) -> Option<Box<dyn GameEngine>>;
}

/// Factory for the two variants implemented in this crate.
pub struct BuiltinGames {
    scores: Rc<RefCell<dyn ScoreLedger>>,
}

impl BuiltinGames {
    pub fn new(scores: Rc<RefCell<dyn ScoreLedger>>) -> Self {
        Self { scores }
    }
}

impl GameFactory for BuiltinGames {
    fn create(
        &self,
        kind: GameKind,
        difficulty: Difficulty,
        rng: GameRng,
    ) -> Option<Box<dyn GameEngine>> {
        match kind {
            GameKind::TicTacToe => Some(Box::new(TicTacToe::new(difficulty, rng))),
            GameKind::Memory => Some(Box::new(MemoryGame::new(
                difficulty,
                rng,
                Rc::clone(&self.scores),
            ))),
            GameKind::Snake | GameKind::Chess => None,
        }
    }
}

/// At-most-once outcome reporting, shared by the game implementations.
///
/// The sink is consumed on the first terminal transition and dropped unfired
/// by `cancel`; once either has happened the instance is inert.
#[derive(Default)]
pub(crate) struct OutcomeLatch {
    outcome: Option<Outcome>,
    cancelled: bool,
    sink: Option<OutcomeSink>,
}

impl OutcomeLatch {
    pub(crate) fn with_sink(sink: Option<OutcomeSink>) -> Self {
        Self {
            outcome: None,
            cancelled: false,
            sink,
        }
    }

    /// Still accepting transitions: no outcome reported, not cancelled.
    pub(crate) fn live(&self) -> bool {
        self.outcome.is_none() && !self.cancelled
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        if !self.live() {
            return;
        }
        self.outcome = Some(outcome);
        if let Some(sink) = self.sink.take() {
            sink(outcome);
        }
    }

    pub(crate) fn cancel(&mut self) {
        self.cancelled = true;
        self.sink = None;
    }
}
