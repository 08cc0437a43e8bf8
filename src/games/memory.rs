//! The timed pair-matching game.
//!
//! 2N cards (N pairs of symbols, N set by difficulty) are dealt face-down in
//! a uniformly shuffled order. `Start` begins the countdown; each `Tick`
//! burns one second. Flipping a second card counts a move and leaves the
//! pair awaiting the deferred `Resolve`: a match locks both cards, a miss
//! turns both back over. Matching every pair before the countdown ends the
//! round with [`Outcome::Win`] and offers the elapsed time and move count to
//! the per-difficulty best-score ledger; running out of time ends it with
//! [`Outcome::NotWin`] and records nothing.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::{Difficulty, GameEngine, GameEvent, GameKind, Outcome, OutcomeLatch, OutcomeSink};
use crate::core::GameRng;
use crate::store::scores::{BestScore, ScoreLedger};

/// One card on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Card {
    symbol: u8,
    face_up: bool,
    matched: bool,
}

impl Card {
    #[must_use]
    pub fn symbol(&self) -> u8 {
        self.symbol
    }

    #[must_use]
    pub fn is_face_up(&self) -> bool {
        self.face_up
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.matched
    }
}

/// A round of the matching game.
pub struct MemoryGame {
    cards: Vec<Card>,
    /// First card of a pair in progress, face-up and unresolved.
    first_flip: Option<usize>,
    /// A flipped pair awaiting the deferred resolution.
    pending: Option<(usize, usize)>,
    moves: u32,
    time_left: u32,
    started: bool,
    difficulty: Difficulty,
    rng: GameRng,
    scores: Rc<RefCell<dyn ScoreLedger>>,
    latch: OutcomeLatch,
}

impl MemoryGame {
    #[must_use]
    pub fn new(difficulty: Difficulty, rng: GameRng, scores: Rc<RefCell<dyn ScoreLedger>>) -> Self {
        let mut game = Self {
            cards: Vec::new(),
            first_flip: None,
            pending: None,
            moves: 0,
            time_left: difficulty.match_time(),
            started: false,
            difficulty,
            rng,
            scores,
            latch: OutcomeLatch::default(),
        };
        game.deal();
        game
    }

    /// Install a callback fired once on the terminal outcome.
    #[must_use]
    pub fn with_outcome_sink(mut self, sink: OutcomeSink) -> Self {
        self.latch = OutcomeLatch::with_sink(Some(sink));
        self
    }

    fn deal(&mut self) {
        let pairs = self.difficulty.pair_count() as u8;
        let mut symbols: Vec<u8> = (0..pairs).chain(0..pairs).collect();
        self.rng.shuffle(&mut symbols);
        self.cards = symbols
            .into_iter()
            .map(|symbol| Card {
                symbol,
                face_up: false,
                matched: false,
            })
            .collect();
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    #[must_use]
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    #[must_use]
    pub fn started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count() / 2
    }

    /// (Re)deal and start the countdown. Ignored once the terminal outcome
    /// was reported.
    pub fn start(&mut self) {
        if !self.latch.live() {
            return;
        }
        self.deal();
        self.first_flip = None;
        self.pending = None;
        self.moves = 0;
        self.time_left = self.difficulty.match_time();
        self.started = true;
    }

    /// Flip a card face-up. A no-op while a pair awaits resolution, before
    /// the round started, after it ended, or on a face-up/matched card.
    pub fn flip(&mut self, card: usize) -> bool {
        if !self.latch.live() || !self.started || self.pending.is_some() {
            return false;
        }
        let Some(target) = self.cards.get(card) else {
            return false;
        };
        if target.face_up || target.matched {
            return false;
        }

        self.cards[card].face_up = true;
        match self.first_flip.take() {
            None => self.first_flip = Some(card),
            Some(first) => {
                self.moves += 1;
                self.pending = Some((first, card));
            }
        }
        true
    }

    /// Resolve a flipped pair: lock a match, turn a miss back over. Winning
    /// the round offers the run to the best-score ledger.
    pub fn resolve(&mut self) -> bool {
        if !self.latch.live() {
            return false;
        }
        let Some((first, second)) = self.pending.take() else {
            return false;
        };

        if self.cards[first].symbol == self.cards[second].symbol {
            self.cards[first].matched = true;
            self.cards[second].matched = true;

            if self.cards.iter().all(|c| c.matched) {
                let elapsed = self.difficulty.match_time() - self.time_left;
                let improved = self.scores.borrow_mut().record(
                    self.difficulty,
                    BestScore {
                        time: elapsed,
                        moves: self.moves,
                    },
                );
                debug!(
                    elapsed,
                    moves = self.moves,
                    improved,
                    "matching board cleared"
                );
                self.latch.finish(Outcome::Win);
            }
        } else {
            self.cards[first].face_up = false;
            self.cards[second].face_up = false;
        }
        true
    }

    /// Burn one second of the countdown. Reaching zero before the board is
    /// cleared ends the round without a win.
    pub fn tick(&mut self) -> bool {
        if !self.latch.live() || !self.started {
            return false;
        }
        self.time_left -= 1;
        if self.time_left == 0 {
            self.latch.finish(Outcome::NotWin);
        }
        true
    }
}

impl GameEngine for MemoryGame {
    fn kind(&self) -> GameKind {
        GameKind::Memory
    }

    fn handle(&mut self, event: GameEvent) {
        match event {
            GameEvent::Start => self.start(),
            GameEvent::Select(card) => {
                self.flip(card);
            }
            GameEvent::Tick => {
                self.tick();
            }
            GameEvent::Resolve => {
                self.resolve();
            }
        }
    }

    fn outcome(&self) -> Option<Outcome> {
        self.latch.outcome()
    }

    fn cancel(&mut self) {
        self.latch.cancel();
    }
}
