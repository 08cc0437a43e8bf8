//! Task progression: the engine, the per-user state it owns, and the
//! achievement evaluator.

pub mod achievements;
pub mod engine;
pub mod snapshot;
pub mod task;

pub use achievements::{Achievement, AchievementDef, DEFINITIONS};
pub use engine::{PendingChallenge, ProgressionEngine};
pub use snapshot::{Snapshot, UserProgress};
pub use task::{Priority, Task, TaskId};
