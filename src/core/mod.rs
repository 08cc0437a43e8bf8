//! Shared building blocks: errors, deterministic RNG, injectable time.

pub mod clock;
pub mod error;
pub mod rng;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{QuestError, Result, StoreError};
pub use rng::GameRng;
