//! The progression engine: task lifecycle, game gating, XP and levels.
//!
//! One engine instance owns one user's [`UserProgress`] for the duration of
//! a session. Every operation is a discrete transition that runs to
//! completion: validate first, mutate, re-derive level and achievements,
//! persist. Completing a task is the only gated transition — it suspends
//! into a pending challenge and only commits when the game reports a win.
//!
//! Saves are fire-and-forget: a failing store is logged and the in-memory
//! state stays committed.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::achievements;
use super::snapshot::{Snapshot, UserProgress};
use super::task::{Priority, Task, TaskId};
use crate::core::{Clock, GameRng, QuestError, Result, StoreError};
use crate::games::{BuiltinGames, Difficulty, GameEngine, GameFactory, GameKind};
use crate::store::scores::{BestScoreBook, ScoreLedger};
use crate::store::SessionStore;

/// The single in-flight challenge, if any. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingChallenge {
    pub task_id: TaskId,
    pub game: GameKind,
    pub difficulty: Difficulty,
}

/// Progression engine for one logged-in user.
pub struct ProgressionEngine<S: SessionStore, C: Clock> {
    user_key: String,
    progress: UserProgress,
    scores: Rc<RefCell<BestScoreBook>>,
    pending: Option<PendingChallenge>,
    next_task_id: u64,
    selected_game: GameKind,
    difficulty: Difficulty,
    factory: Box<dyn GameFactory>,
    store: S,
    clock: C,
    rng: GameRng,
}

impl<S: SessionStore, C: Clock> ProgressionEngine<S, C> {
    /// Open a session: load the user's snapshot (or start fresh), merge
    /// persisted achievement flags onto the definition table, and roll stale
    /// daily state forward to today.
    pub fn start_session(
        store: S,
        clock: C,
        user_key: impl Into<String>,
        seed: u64,
    ) -> std::result::Result<Self, StoreError> {
        let user_key = user_key.into();

        let (mut progress, scores) = match store.load(&user_key)? {
            Some(snapshot) => {
                let mut progress = snapshot.progress;
                progress.achievements = achievements::merge_saved(&progress.achievements);
                (progress, snapshot.scores)
            }
            None => (UserProgress::new(), BestScoreBook::new()),
        };
        progress.recompute_level();

        let today = clock.now().date_naive();
        roll_forward(&mut progress, today);

        let next_task_id = progress
            .tasks
            .iter()
            .map(|t| t.id.raw() + 1)
            .max()
            .unwrap_or(1);

        let scores = Rc::new(RefCell::new(scores));
        let scores_dyn: Rc<RefCell<dyn ScoreLedger>> = scores.clone();
        let factory = Box::new(BuiltinGames::new(scores_dyn));

        debug!(user = %user_key, tasks = progress.tasks.len(), "session opened");
        Ok(Self {
            user_key,
            progress,
            scores,
            pending: None,
            next_task_id,
            selected_game: GameKind::TicTacToe,
            difficulty: Difficulty::Medium,
            factory,
            store,
            clock,
            rng: GameRng::new(seed),
        })
    }

    /// Replace the game factory, e.g. to add the host-supplied variants.
    #[must_use]
    pub fn with_factory(mut self, factory: Box<dyn GameFactory>) -> Self {
        self.factory = factory;
        self
    }

    // === Read access ===

    #[must_use]
    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingChallenge> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn selected_game(&self) -> GameKind {
        self.selected_game
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Shared handle to the per-user best-score table, for host factories
    /// and score displays.
    #[must_use]
    pub fn scores(&self) -> Rc<RefCell<BestScoreBook>> {
        Rc::clone(&self.scores)
    }

    #[must_use]
    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    // === Session configuration ===

    /// Choose the variant for the next challenge.
    pub fn select_game(&mut self, game: GameKind) {
        self.selected_game = game;
    }

    /// Choose the difficulty for the next challenge.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    // === Task lifecycle ===

    /// Add a task. The XP award is fixed from the priority here and never
    /// changes afterwards.
    pub fn add_task(&mut self, text: &str, priority: Priority) -> Result<TaskId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QuestError::EmptyText);
        }

        let id = TaskId::new(self.next_task_id);
        self.next_task_id += 1;
        self.progress
            .tasks
            .push_back(Task::new(id, text, priority, self.clock.now()));

        debug!(task = %id, ?priority, "task added");
        self.recompute();
        self.persist();
        Ok(id)
    }

    /// Suspend completion of a task behind a freshly constructed game of the
    /// selected variant. The completion only commits via [`Self::on_game_won`].
    ///
    /// A second challenge while one is pending is rejected without touching
    /// any state.
    pub fn request_completion(&mut self, task_id: TaskId) -> Result<Box<dyn GameEngine>> {
        if let Some(pending) = &self.pending {
            return Err(QuestError::ChallengePending(pending.task_id));
        }

        let task = self
            .progress
            .find_task(task_id)
            .ok_or(QuestError::NotFound(task_id))?;
        if task.completed {
            return Err(QuestError::NoOp("task is already completed"));
        }

        let game = self
            .factory
            .create(self.selected_game, self.difficulty, self.rng.fork())
            .ok_or(QuestError::UnsupportedGame(self.selected_game))?;

        self.pending = Some(PendingChallenge {
            task_id,
            game: self.selected_game,
            difficulty: self.difficulty,
        });
        debug!(task = %task_id, game = %self.selected_game, "challenge started");
        Ok(game)
    }

    /// Commit a game win. Idempotent: if the task was deleted or completed
    /// while the game ran, this clears the challenge and changes nothing
    /// else.
    pub fn on_game_won(&mut self, task_id: TaskId) {
        self.pending = None;

        let now = self.clock.now();
        let Some(index) = self.progress.task_index(task_id) else {
            debug!(task = %task_id, "won a game for a task that no longer exists");
            return;
        };

        let gained = {
            let Some(task) = self.progress.tasks.get_mut(index) else {
                return;
            };
            if task.completed {
                debug!(task = %task_id, "won a game for an already-completed task");
                return;
            }
            task.completed = true;
            task.completed_at = Some(now);
            task.xp
        };

        self.note_completion_day(now.date_naive());
        self.progress.xp += gained;
        self.progress.tasks_completed_today += 1;
        self.progress.games_won += 1;

        info!(task = %task_id, xp = gained, "task completed after game win");
        self.recompute();
        self.persist();
    }

    /// Drop the pending challenge without completing anything.
    pub fn on_game_abandoned(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(task = %pending.task_id, "challenge abandoned");
        }
    }

    /// Revert a completed task to incomplete, taking its XP back (clamped
    /// at zero, like the daily counter).
    pub fn uncomplete_task(&mut self, task_id: TaskId) -> Result<()> {
        let index = self
            .progress
            .task_index(task_id)
            .ok_or(QuestError::NotFound(task_id))?;

        let reverted = {
            let Some(task) = self.progress.tasks.get_mut(index) else {
                return Err(QuestError::NotFound(task_id));
            };
            if !task.completed {
                return Err(QuestError::NoOp("task is not completed"));
            }
            task.completed = false;
            task.completed_at = None;
            task.xp
        };

        self.progress.xp = self.progress.xp.saturating_sub(reverted);
        self.progress.tasks_completed_today = self.progress.tasks_completed_today.saturating_sub(1);

        debug!(task = %task_id, xp = reverted, "task uncompleted");
        self.recompute();
        self.persist();
        Ok(())
    }

    /// Delete a task. A completed task gives its XP and daily count back
    /// first, exactly as uncompletion would.
    pub fn delete_task(&mut self, task_id: TaskId) -> Result<()> {
        let index = self
            .progress
            .task_index(task_id)
            .ok_or(QuestError::NotFound(task_id))?;

        let task = self.progress.tasks.remove(index);
        if task.completed {
            self.progress.xp = self.progress.xp.saturating_sub(task.xp);
            self.progress.tasks_completed_today =
                self.progress.tasks_completed_today.saturating_sub(1);
        }

        debug!(task = %task_id, was_completed = task.completed, "task deleted");
        self.recompute();
        self.persist();
        Ok(())
    }

    /// Close the session: one final save, then the in-memory state is gone.
    pub fn logout(mut self) {
        self.persist();
        info!(user = %self.user_key, "session closed");
    }

    // === Derived state ===

    /// Re-derive level and achievement unlocks. Runs at the end of every
    /// mutating operation.
    fn recompute(&mut self) {
        self.progress.recompute_level();
        for id in achievements::refresh(&mut self.progress) {
            info!(achievement = id, "achievement unlocked");
        }
    }

    /// Streak and daily-counter bookkeeping for a completion on `today`.
    fn note_completion_day(&mut self, today: NaiveDate) {
        if self.progress.last_completed_on != Some(today) {
            self.progress.tasks_completed_today = 0;
        }
        match self.progress.last_completed_on {
            Some(prev) if prev == today => {}
            Some(prev) if today.signed_duration_since(prev).num_days() == 1 => {
                self.progress.streak += 1;
            }
            _ => self.progress.streak = 1,
        }
        self.progress.last_completed_on = Some(today);
    }

    /// Best-effort save of the current snapshot.
    fn persist(&mut self) {
        let snapshot = Snapshot {
            progress: self.progress.clone(),
            scores: self.scores.borrow().clone(),
        };
        if let Err(err) = self.store.save(&self.user_key, &snapshot) {
            warn!(user = %self.user_key, error = %err, "snapshot save failed");
        }
    }
}

/// Bring stale daily state up to `today` at session start: the daily counter
/// only survives within its day, the streak survives one day back.
fn roll_forward(progress: &mut UserProgress, today: NaiveDate) {
    match progress.last_completed_on {
        Some(last) if last == today => {}
        Some(last) => {
            progress.tasks_completed_today = 0;
            if today.signed_duration_since(last).num_days() > 1 {
                progress.streak = 0;
            }
        }
        None => progress.tasks_completed_today = 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock::at(Utc.with_ymd_and_hms(2024, 9, 10, 12, 0, 0).unwrap())
    }

    fn engine() -> ProgressionEngine<MemoryStore, FixedClock> {
        ProgressionEngine::start_session(MemoryStore::new(), clock(), "user@example.com", 42)
            .unwrap()
    }

    /// Complete a task by winning its challenge (the game itself is
    /// exercised in the games module and the integration tests).
    fn win<S: SessionStore>(engine: &mut ProgressionEngine<S, FixedClock>, task: TaskId) {
        let game = engine.request_completion(task).unwrap();
        drop(game);
        engine.on_game_won(task);
    }

    #[test]
    fn test_add_task_validates_text() {
        let mut engine = engine();

        assert!(matches!(engine.add_task("", Priority::Low), Err(QuestError::EmptyText)));
        assert!(matches!(engine.add_task("   ", Priority::Low), Err(QuestError::EmptyText)));
        assert!(engine.progress().tasks.is_empty());

        let id = engine.add_task("  water the plants  ", Priority::Medium).unwrap();
        let task = engine.progress().find_task(id).unwrap();
        assert_eq!(task.text, "water the plants");
        assert_eq!(task.xp, 20);
    }

    #[test]
    fn test_task_ids_are_unique_and_survive_reload() {
        let mut engine = engine();
        let a = engine.add_task("a", Priority::Low).unwrap();
        let b = engine.add_task("b", Priority::Low).unwrap();
        assert_ne!(a, b);

        engine.delete_task(a).unwrap();
        let c = engine.add_task("c", Priority::Low).unwrap();
        assert_ne!(b, c);
    }

    #[test]
    fn test_win_commits_completion_and_stats() {
        let mut engine = engine();
        let id = engine.add_task("deep work", Priority::High).unwrap();

        win(&mut engine, id);

        let progress = engine.progress();
        let task = progress.find_task(id).unwrap();
        assert!(task.completed);
        assert!(task.completed_at.is_some());
        assert!(task.completed_at.unwrap() >= task.created_at);
        assert_eq!(progress.xp, 30);
        assert_eq!(progress.level, 1);
        assert_eq!(progress.tasks_completed_today, 1);
        assert_eq!(progress.games_won, 1);
        assert_eq!(progress.streak, 1);
        assert!(progress.achievement("first-task").unwrap().unlocked);
        assert!(engine.pending().is_none());
    }

    #[test]
    fn test_win_is_idempotent() {
        let mut engine = engine();
        let id = engine.add_task("once", Priority::High).unwrap();

        win(&mut engine, id);
        engine.on_game_won(id);
        engine.on_game_won(id);

        assert_eq!(engine.progress().xp, 30);
        assert_eq!(engine.progress().games_won, 1);
        assert_eq!(engine.progress().tasks_completed_today, 1);
    }

    #[test]
    fn test_win_for_deleted_task_is_a_full_no_op() {
        let mut engine = engine();
        let id = engine.add_task("doomed", Priority::High).unwrap();

        let game = engine.request_completion(id).unwrap();
        drop(game);
        // The task vanishes while the game is being played.
        engine.delete_task(id).unwrap();
        engine.on_game_won(id);

        assert_eq!(engine.progress().xp, 0);
        assert_eq!(engine.progress().games_won, 0);
        assert_eq!(engine.progress().tasks_completed_today, 0);
        assert!(engine.pending().is_none());
    }

    #[test]
    fn test_request_completion_guards() {
        let mut engine = engine();
        let id = engine.add_task("guarded", Priority::Low).unwrap();

        assert!(matches!(
            engine.request_completion(TaskId::new(999)),
            Err(QuestError::NotFound(_))
        ));

        let game = engine.request_completion(id).unwrap();
        drop(game);
        // One challenge at a time.
        let second = engine.add_task("second", Priority::Low).unwrap();
        assert!(matches!(
            engine.request_completion(second),
            Err(QuestError::ChallengePending(p)) if p == id
        ));

        engine.on_game_abandoned();
        assert!(engine.pending().is_none());

        win(&mut engine, id);
        assert!(matches!(
            engine.request_completion(id),
            Err(QuestError::NoOp(_))
        ));
    }

    #[test]
    fn test_unsupported_variant_is_rejected() {
        let mut engine = engine();
        let id = engine.add_task("snake someday", Priority::Low).unwrap();

        engine.select_game(GameKind::Snake);
        assert!(matches!(
            engine.request_completion(id),
            Err(QuestError::UnsupportedGame(GameKind::Snake))
        ));
        // The failed request must not leave a dangling challenge.
        assert!(engine.pending().is_none());
    }

    #[test]
    fn test_abandon_changes_nothing_else() {
        let mut engine = engine();
        let id = engine.add_task("later", Priority::Medium).unwrap();

        let game = engine.request_completion(id).unwrap();
        drop(game);
        engine.on_game_abandoned();

        let progress = engine.progress();
        assert!(!progress.find_task(id).unwrap().completed);
        assert_eq!(progress.xp, 0);
        assert_eq!(progress.games_won, 0);
    }

    #[test]
    fn test_uncomplete_reverts_with_clamping() {
        let mut engine = engine();
        let id = engine.add_task("undo me", Priority::High).unwrap();
        win(&mut engine, id);
        assert_eq!(engine.progress().xp, 30);

        engine.uncomplete_task(id).unwrap();
        let progress = engine.progress();
        let task = progress.find_task(id).unwrap();
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(progress.xp, 0);
        assert_eq!(progress.tasks_completed_today, 0);
        assert_eq!(progress.level, 1);

        // Redundant uncompletion is a no-op error; nothing changes.
        assert!(matches!(
            engine.uncomplete_task(id),
            Err(QuestError::NoOp(_))
        ));
        // The first-task badge stays unlocked.
        assert!(engine.progress().achievement("first-task").unwrap().unlocked);
    }

    #[test]
    fn test_delete_completed_task_reverts_stats() {
        let mut engine = engine();
        let id = engine.add_task("gone", Priority::High).unwrap();
        win(&mut engine, id);

        engine.delete_task(id).unwrap();

        let progress = engine.progress();
        assert!(progress.tasks.is_empty());
        assert_eq!(progress.xp, 0);
        assert_eq!(progress.tasks_completed_today, 0);
        assert_eq!(progress.level, 1);

        assert!(matches!(
            engine.delete_task(id),
            Err(QuestError::NotFound(_))
        ));
    }

    #[test]
    fn test_level_can_drop_when_xp_is_taken_back() {
        let mut engine = engine();

        // Four high tasks: 120 xp, level 2.
        let ids: Vec<_> = (0..4)
            .map(|i| engine.add_task(&format!("t{i}"), Priority::High).unwrap())
            .collect();
        for &id in &ids {
            win(&mut engine, id);
        }
        assert_eq!(engine.progress().xp, 120);
        assert_eq!(engine.progress().level, 2);

        engine.uncomplete_task(ids[0]).unwrap();
        assert_eq!(engine.progress().xp, 90);
        assert_eq!(engine.progress().level, 1);
    }

    #[test]
    fn test_streak_arithmetic_across_days() {
        let clock = clock();
        let mut engine = ProgressionEngine::start_session(
            MemoryStore::new(),
            clock.clone(),
            "streaker",
            7,
        )
        .unwrap();

        let complete_one = |engine: &mut ProgressionEngine<MemoryStore, FixedClock>| {
            let id = engine.add_task("daily", Priority::Low).unwrap();
            win(engine, id);
        };

        complete_one(&mut engine);
        assert_eq!(engine.progress().streak, 1);
        assert_eq!(engine.progress().tasks_completed_today, 1);

        // Second completion the same day: streak holds, counter grows.
        complete_one(&mut engine);
        assert_eq!(engine.progress().streak, 1);
        assert_eq!(engine.progress().tasks_completed_today, 2);

        // Next day: streak grows, counter restarts.
        clock.advance(Duration::days(1));
        complete_one(&mut engine);
        assert_eq!(engine.progress().streak, 2);
        assert_eq!(engine.progress().tasks_completed_today, 1);

        clock.advance(Duration::days(1));
        complete_one(&mut engine);
        assert_eq!(engine.progress().streak, 3);
        assert!(engine.progress().achievement("streak-3").unwrap().unlocked);

        // A three-day gap restarts the streak at 1.
        clock.advance(Duration::days(3));
        complete_one(&mut engine);
        assert_eq!(engine.progress().streak, 1);
        // The badge survives the broken streak.
        assert!(engine.progress().achievement("streak-3").unwrap().unlocked);
    }

    #[test]
    fn test_roll_forward_on_stale_snapshot() {
        let today = Utc.with_ymd_and_hms(2024, 9, 10, 8, 0, 0).unwrap().date_naive();

        // Completed yesterday: counter resets, streak survives.
        let mut progress = UserProgress::new();
        progress.streak = 5;
        progress.tasks_completed_today = 4;
        progress.last_completed_on = Some(today - Duration::days(1));
        roll_forward(&mut progress, today);
        assert_eq!(progress.tasks_completed_today, 0);
        assert_eq!(progress.streak, 5);

        // Completed three days ago: both reset.
        let mut progress = UserProgress::new();
        progress.streak = 5;
        progress.tasks_completed_today = 4;
        progress.last_completed_on = Some(today - Duration::days(3));
        roll_forward(&mut progress, today);
        assert_eq!(progress.tasks_completed_today, 0);
        assert_eq!(progress.streak, 0);

        // Completed earlier today: everything holds.
        let mut progress = UserProgress::new();
        progress.streak = 5;
        progress.tasks_completed_today = 4;
        progress.last_completed_on = Some(today);
        roll_forward(&mut progress, today);
        assert_eq!(progress.tasks_completed_today, 4);
        assert_eq!(progress.streak, 5);
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut engine = engine();

        let id = engine.add_task("tracked", Priority::Low).unwrap();
        win(&mut engine, id);
        engine.uncomplete_task(id).unwrap();
        engine.delete_task(id).unwrap();

        // add + win + uncomplete + delete.
        assert_eq!(engine.store.save_count(), 4);

        let snapshot = engine.store.get("user@example.com").unwrap();
        assert!(snapshot.progress.tasks.is_empty());
    }

    #[test]
    fn test_session_reload_restores_achievements_and_ids() {
        let mut engine = engine();
        let id = engine.add_task("persisted", Priority::High).unwrap();
        win(&mut engine, id);

        // Move the whole store into a fresh session, as a new login would.
        let ProgressionEngine { store, .. } = engine;
        let reloaded =
            ProgressionEngine::start_session(store, clock(), "user@example.com", 43).unwrap();

        assert_eq!(reloaded.progress().xp, 30);
        assert!(reloaded.progress().achievement("first-task").unwrap().unlocked);
        assert_eq!(reloaded.progress().find_task(id).unwrap().text, "persisted");

        // New ids keep counting past the persisted ones.
        let mut reloaded = reloaded;
        let next = reloaded.add_task("new", Priority::Low).unwrap();
        assert!(next.raw() > id.raw());
    }

    #[test]
    fn test_store_failure_never_rolls_back() {
        struct BrokenStore;

        impl SessionStore for BrokenStore {
            fn load(&self, _key: &str) -> std::result::Result<Option<Snapshot>, StoreError> {
                Ok(None)
            }
            fn save(
                &mut self,
                _key: &str,
                _snapshot: &Snapshot,
            ) -> std::result::Result<(), StoreError> {
                Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk on fire",
                )))
            }
        }

        let mut engine =
            ProgressionEngine::start_session(BrokenStore, clock(), "user", 1).unwrap();

        let id = engine.add_task("kept anyway", Priority::Medium).unwrap();
        win(&mut engine, id);

        assert_eq!(engine.progress().xp, 20);
        assert!(engine.progress().find_task(id).unwrap().completed);
    }
}
