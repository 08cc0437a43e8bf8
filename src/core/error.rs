//! Error taxonomy for progression operations and persistence.

use thiserror::Error;

use crate::games::GameKind;
use crate::progress::TaskId;

/// Errors surfaced by progression operations.
///
/// `NoOp` is non-fatal: the attempted operation was redundant and the caller
/// may treat it as success. `EmptyText`/`NotFound` abort the operation with
/// no partial state change.
#[derive(Debug, Error)]
pub enum QuestError {
    #[error("task text must not be empty")]
    EmptyText,

    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("operation is a no-op: {0}")]
    NoOp(&'static str),

    #[error("a challenge is already pending for task {0}")]
    ChallengePending(TaskId),

    #[error("no game registered for {0}")]
    UnsupportedGame(GameKind),

    #[error("session store failure: {0}")]
    Store(#[from] StoreError),
}

impl QuestError {
    /// Stable machine-readable code, used as a tracing field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyText => "empty_text",
            Self::NotFound(_) => "not_found",
            Self::NoOp(_) => "no_op",
            Self::ChallengePending(_) => "challenge_pending",
            Self::UnsupportedGame(_) => "unsupported_game",
            Self::Store(_) => "store_error",
        }
    }
}

/// Errors from a session store backend.
///
/// Saves are fire-and-forget from the engine's perspective; these errors are
/// logged by the engine and never roll back an in-memory mutation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, QuestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(QuestError::EmptyText.code(), "empty_text");
        assert_eq!(QuestError::NotFound(TaskId::new(3)).code(), "not_found");
        assert_eq!(QuestError::NoOp("already completed").code(), "no_op");
    }

    #[test]
    fn test_display_includes_task_id() {
        let err = QuestError::NotFound(TaskId::new(42));
        assert_eq!(err.to_string(), "task 42 not found");
    }

    #[test]
    fn test_store_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = QuestError::from(StoreError::from(io));
        assert_eq!(err.code(), "store_error");
    }
}
