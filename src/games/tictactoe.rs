//! The 3×3 grid game: player versus a heuristic opponent.
//!
//! Alternating turns on nine cells. A player line ends the round with
//! [`Outcome::Win`]; an opponent line or a full board ends it with
//! [`Outcome::NotWin`]. The opponent's reply is a deferred transition: after
//! a legal player move the host schedules [`GameEvent::Resolve`], which asks
//! the decision policy for a cell. Difficulty parameterizes only the policy,
//! never the win-detection rules.

use serde::{Deserialize, Serialize};

use super::policy;
use super::{Difficulty, GameEngine, GameEvent, GameKind, Outcome, OutcomeLatch, OutcomeSink};
use crate::core::GameRng;

/// The three rows, three columns and two diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Who owns a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    Player,
    Opponent,
}

/// A 3×3 board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [Option<Mark>; 9],
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The mark on a cell, if any. Out-of-range indices read as occupied
    /// never, owned by no one.
    #[must_use]
    pub fn cell(&self, cell: usize) -> Option<Mark> {
        self.cells.get(cell).copied().flatten()
    }

    /// True if `cell` is a valid, unoccupied index.
    #[must_use]
    pub fn is_open(&self, cell: usize) -> bool {
        cell < 9 && self.cells[cell].is_none()
    }

    /// Place a mark. The cell must be open.
    pub fn place(&mut self, cell: usize, mark: Mark) {
        debug_assert!(self.is_open(cell), "cell {cell} is not open");
        self.cells[cell] = Some(mark);
    }

    /// Iterate open cells in ascending order.
    pub fn open_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The mark holding a completed line, if any.
    #[must_use]
    pub fn line_owner(&self) -> Option<Mark> {
        for [a, b, c] in LINES {
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return Some(mark);
                }
            }
        }
        None
    }

    /// The lowest-indexed open cell that would complete a line for `mark`,
    /// if one exists.
    #[must_use]
    pub fn winning_move(&self, mark: Mark) -> Option<usize> {
        self.open_cells().find(|&cell| {
            let mut trial = *self;
            trial.place(cell, mark);
            trial.line_owner() == Some(mark)
        })
    }
}

/// A single round of the grid game.
pub struct TicTacToe {
    board: Board,
    turn: Mark,
    difficulty: Difficulty,
    rng: GameRng,
    latch: OutcomeLatch,
}

impl TicTacToe {
    #[must_use]
    pub fn new(difficulty: Difficulty, rng: GameRng) -> Self {
        Self {
            board: Board::new(),
            turn: Mark::Player,
            difficulty,
            rng,
            latch: OutcomeLatch::default(),
        }
    }

    /// Install a callback fired once on the terminal outcome.
    #[must_use]
    pub fn with_outcome_sink(mut self, sink: OutcomeSink) -> Self {
        self.latch = OutcomeLatch::with_sink(Some(sink));
        self
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Whose move it is. Meaningless once the round is over.
    #[must_use]
    pub fn turn(&self) -> Mark {
        self.turn
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Apply a player move. Returns false (no state change) if the cell is
    /// occupied, it is not the player's turn, or the round is over.
    pub fn play(&mut self, cell: usize) -> bool {
        if !self.latch.live() || self.turn != Mark::Player || !self.board.is_open(cell) {
            return false;
        }

        self.board.place(cell, Mark::Player);

        if self.board.line_owner() == Some(Mark::Player) {
            self.latch.finish(Outcome::Win);
        } else if self.board.is_full() {
            self.latch.finish(Outcome::NotWin);
        } else {
            self.turn = Mark::Opponent;
        }
        true
    }

    /// Apply the opponent's reply, chosen by the decision policy. A no-op
    /// unless it is the opponent's turn in a live round.
    pub fn opponent_reply(&mut self) -> bool {
        if !self.latch.live() || self.turn != Mark::Opponent {
            return false;
        }

        let Some(cell) = policy::decide(&self.board, self.difficulty, &mut self.rng) else {
            return false;
        };
        self.board.place(cell, Mark::Opponent);

        if self.board.line_owner() == Some(Mark::Opponent) {
            self.latch.finish(Outcome::NotWin);
        } else if self.board.is_full() {
            self.latch.finish(Outcome::NotWin);
        } else {
            self.turn = Mark::Player;
        }
        true
    }

    /// Clear the board for a fresh round. Ignored once the terminal outcome
    /// was reported.
    pub fn restart(&mut self) {
        if !self.latch.live() {
            return;
        }
        self.board = Board::new();
        self.turn = Mark::Player;
    }
}

impl GameEngine for TicTacToe {
    fn kind(&self) -> GameKind {
        GameKind::TicTacToe
    }

    fn handle(&mut self, event: GameEvent) {
        match event {
            GameEvent::Start => self.restart(),
            GameEvent::Select(cell) => {
                self.play(cell);
            }
            GameEvent::Resolve => {
                self.opponent_reply();
            }
            GameEvent::Tick => {}
        }
    }

    fn outcome(&self) -> Option<Outcome> {
        self.latch.outcome()
    }

    fn cancel(&mut self) {
        self.latch.cancel();
    }
}
