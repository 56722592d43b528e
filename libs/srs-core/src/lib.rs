//! Pure spaced-repetition scheduling core.
//!
//! Provides:
//! - Per-card scheduling state and the four-grade review vocabulary
//! - The FSRS scheduler (forgetting-curve math, four-grade branching)
//! - Retention estimation from elapsed time and stability
//!
//! No I/O and no clock: callers supply the review time and persist the
//! returned state themselves.

pub mod error;
pub mod scheduler;
pub mod types;

pub use error::{Result, SchedulerError};
pub use scheduler::{Fsrs, SchedulerConfig};
pub use types::{CardState, CardStatus, Grade};
