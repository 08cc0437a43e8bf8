//! The per-user progress value and the persisted snapshot around it.

use chrono::NaiveDate;
use im::Vector;
use serde::{Deserialize, Serialize};

use super::achievements::{self, Achievement};
use super::task::{Task, TaskId};
use crate::store::scores::BestScoreBook;

/// Everything the progression engine owns for one user.
///
/// `level` is derived: `xp / 100 + 1`, recomputed after every xp change and
/// never maintained through a separate increment path. That means level can
/// drop when uncompleting or deleting tasks pulls xp back down.
///
/// The task list is an `im::Vector` so cloning the whole value for the
/// save-after-every-mutation discipline is O(1).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub xp: u32,
    pub level: u32,
    pub streak: u32,
    pub tasks_completed_today: u32,
    pub games_won: u32,
    pub tasks: Vector<Task>,
    pub achievements: Vec<Achievement>,
    /// Date of the most recent committed completion, driving the streak and
    /// the daily counter rollover.
    pub last_completed_on: Option<NaiveDate>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            streak: 0,
            tasks_completed_today: 0,
            games_won: 0,
            tasks: Vector::new(),
            achievements: achievements::fresh(),
            last_completed_on: None,
        }
    }
}

impl UserProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derive `level` from `xp`. The single source of truth for level.
    pub fn recompute_level(&mut self) {
        self.level = self.xp / 100 + 1;
    }

    #[must_use]
    pub fn find_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub(crate) fn task_index(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Completed share of the current task list, 0.0 for an empty list.
    #[must_use]
    pub fn completion_rate(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.tasks.len() as f64
    }

    /// XP gathered within the current level.
    #[must_use]
    pub fn xp_into_level(&self) -> u32 {
        self.xp % 100
    }

    #[must_use]
    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }
}

/// The unit of persistence: progress plus the per-user best-score table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub progress: UserProgress,
    pub scores: BestScoreBook,
}
