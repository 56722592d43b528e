//! Error types for srs-core.

use thiserror::Error;

/// Result type alias using SchedulerError.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors from the scheduling core.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Grade outside the four-valued domain. Programmer error; fail fast.
    #[error("invalid grade value: {value}")]
    InvalidGrade { value: u8 },

    /// Persisted record violates the data-model invariants. The caller
    /// should treat the card as needing reinitialization.
    #[error("invalid card state: {reason}")]
    InvalidState { reason: String },
}
