//! Tasks: the unit of work whose completion is gated behind a game win.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task identifier, unique within a user's task set for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl TaskId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task priority, fixing the XP award at creation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// XP awarded for completing a task of this priority.
    #[must_use]
    pub const fn xp(self) -> u32 {
        match self {
            Self::Low => 10,
            Self::Medium => 20,
            Self::High => 30,
        }
    }
}

/// A user-defined task.
///
/// `xp` is copied from the priority table at creation and never changes,
/// even if the tables ever do. `completed_at` is set exactly when
/// `completed` is, and never precedes `created_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub xp: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    #[must_use]
    pub fn new(id: TaskId, text: impl Into<String>, priority: Priority, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            priority,
            xp: priority.xp(),
            created_at,
            completed_at: None,
        }
    }
}
