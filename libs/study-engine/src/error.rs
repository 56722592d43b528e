//! Error types for the study engine.

use srs_core::SchedulerError;
use thiserror::Error;

/// Result type alias using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors from queue building, sessions, and statistics.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session queue has no card under the cursor. Expected at the end
    /// of a session; surfaces to the user as "nothing to study now".
    #[error("no cards left to study")]
    EmptyQueue,

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Passed through from the storage collaborator unmodified. Never
    /// retried: a dropped grade would corrupt the learning history.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
