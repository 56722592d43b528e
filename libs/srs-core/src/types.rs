//! Core types for the spaced-repetition scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Card lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    New,
    Learning,
    Review,
    Relearning,
}

impl Default for CardStatus {
    fn default() -> Self {
        Self::New
    }
}

/// Review outcome reported by the learner, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    /// All grades in worst-to-best order.
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Zero-based index for grade-keyed fixed arrays.
    pub fn index(self) -> usize {
        self.to_value() as usize - 1
    }
}

impl TryFrom<u8> for Grade {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            _ => Err(SchedulerError::InvalidGrade { value }),
        }
    }
}

/// Per-card scheduling state.
///
/// Mutated exactly once per review: read, recomputed by the scheduler,
/// persisted. `elapsed_days` and `scheduled_days` record the values used for
/// the most recent computation and feed the next review's elapsed/scheduled
/// comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardState {
    pub status: CardStatus,
    /// When the card should next be shown.
    pub due: DateTime<Utc>,
    /// Estimated days until recall probability decays to the target.
    pub stability: f64,
    /// Intrinsic resistance to stabilization, 1-10 once reviewed.
    pub difficulty: f64,
    pub elapsed_days: f64,
    pub scheduled_days: f64,
    /// Total presentations.
    pub reps: u32,
    /// Times forgotten after leaving the learning phase.
    pub lapses: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
}

impl CardState {
    /// State for a card that has never been presented.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: CardStatus::New,
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0.0,
            scheduled_days: 0.0,
            reps: 0,
            lapses: 0,
            last_review: None,
        }
    }

    /// Check the data-model invariants.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !self.stability.is_finite() || self.stability < 0.0 {
            return Err(SchedulerError::InvalidState {
                reason: format!("stability {} out of range", self.stability),
            });
        }
        if !self.difficulty.is_finite() || self.difficulty < 0.0 {
            return Err(SchedulerError::InvalidState {
                reason: format!("difficulty {} out of range", self.difficulty),
            });
        }
        if self.elapsed_days < 0.0 || self.scheduled_days < 0.0 {
            return Err(SchedulerError::InvalidState {
                reason: "negative day counter".to_string(),
            });
        }
        match self.status {
            CardStatus::New => {
                if self.reps != 0 || self.last_review.is_some() {
                    return Err(SchedulerError::InvalidState {
                        reason: "new card with review history".to_string(),
                    });
                }
            }
            _ => {
                if self.stability == 0.0 {
                    return Err(SchedulerError::InvalidState {
                        reason: "reviewed card without stability".to_string(),
                    });
                }
                if self.reps == 0 || self.last_review.is_none() {
                    return Err(SchedulerError::InvalidState {
                        reason: "reviewed card without review history".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
