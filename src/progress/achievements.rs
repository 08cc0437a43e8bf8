//! Achievement definitions and the unlock evaluator.
//!
//! The definition table is fixed and process-wide; a user only carries the
//! per-achievement `unlocked` flag. [`refresh`] re-evaluates every predicate
//! against the current progress and latches new unlocks. An unlocked
//! achievement stays unlocked for the rest of the session no matter how the
//! underlying numbers move afterwards.

use serde::{Deserialize, Serialize};

use super::snapshot::UserProgress;

/// A fixed achievement definition.
#[derive(Clone, Copy, Debug)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// The process-wide definition table.
pub const DEFINITIONS: [AchievementDef; 4] = [
    AchievementDef {
        id: "first-task",
        name: "Getting Started",
        description: "Complete your first task",
    },
    AchievementDef {
        id: "streak-3",
        name: "On Fire",
        description: "Maintain a 3-day streak",
    },
    AchievementDef {
        id: "tasks-10",
        name: "Productive",
        description: "Complete 10 tasks in one day",
    },
    AchievementDef {
        id: "level-5",
        name: "Level Master",
        description: "Reach level 5",
    },
];

/// Per-user unlock state for one achievement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub unlocked: bool,
}

/// Look up a definition by id.
#[must_use]
pub fn definition(id: &str) -> Option<&'static AchievementDef> {
    DEFINITIONS.iter().find(|def| def.id == id)
}

/// The all-locked state for a fresh user.
#[must_use]
pub fn fresh() -> Vec<Achievement> {
    DEFINITIONS
        .iter()
        .map(|def| Achievement {
            id: def.id.to_owned(),
            unlocked: false,
        })
        .collect()
}

/// Merge persisted unlock flags onto the definition table: definition order,
/// unknown ids dropped, missing ids locked.
#[must_use]
pub fn merge_saved(saved: &[Achievement]) -> Vec<Achievement> {
    DEFINITIONS
        .iter()
        .map(|def| Achievement {
            id: def.id.to_owned(),
            unlocked: saved.iter().any(|a| a.id == def.id && a.unlocked),
        })
        .collect()
}

/// Whether the predicate for `id` currently holds.
fn earned(id: &str, progress: &UserProgress) -> bool {
    match id {
        "first-task" => progress.tasks.iter().any(|t| t.completed),
        "streak-3" => progress.streak >= 3,
        "tasks-10" => progress.tasks_completed_today >= 10,
        "level-5" => progress.level >= 5,
        _ => false,
    }
}

/// Re-evaluate all predicates and latch new unlocks.
///
/// Returns the ids unlocked by this call, in definition order.
pub fn refresh(progress: &mut UserProgress) -> Vec<&'static str> {
    let mut newly = Vec::new();

    for index in 0..progress.achievements.len() {
        if progress.achievements[index].unlocked {
            continue;
        }
        let Some(def) = definition(&progress.achievements[index].id) else {
            continue;
        };
        if earned(def.id, progress) {
            progress.achievements[index].unlocked = true;
            newly.push(def.id);
        }
    }

    newly
}
