//! FSRS (Free Spaced Repetition Scheduler) implementation.
//!
//! DSR memory model:
//! - Difficulty (D): intrinsic resistance to stabilization, 1-10
//! - Stability (S): days until recall probability decays to the target
//! - Retrievability (R): probability of recall at a given elapsed time

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::types::{CardState, CardStatus, Grade};

/// Stability below this is treated as "never stabilized".
const STABILITY_EPSILON: f64 = 1e-6;
const MIN_STABILITY: f64 = 0.1;
const MIN_DIFFICULTY: f64 = 1.0;
const MAX_DIFFICULTY: f64 = 10.0;

/// Scheduler tuning, fixed at startup and passed to [`Fsrs::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Target recall probability used to invert the forgetting curve.
    pub request_retention: f64,
    /// Upper bound on any scheduled interval, in days.
    pub maximum_interval: f64,
    /// FSRS-4.5 parameters (17 weights).
    pub weights: [f64; 17],
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            request_retention: 0.9,
            maximum_interval: 365.0,
            weights: [
                0.4, 0.6, 2.4, 5.8, // w[0-3]: initial stability for Again, Hard, Good, Easy
                4.93, // w[4]: initial difficulty base
                0.94, // w[5]: initial difficulty modifier
                0.86, // w[6]: difficulty decay
                0.01, // w[7]: mean reversion weight
                1.49, // w[8]: stability exp base
                0.14, // w[9]: stability decay
                0.94, // w[10]: retrievability effect
                2.18, // w[11]: forget stability base
                0.05, // w[12]: difficulty on forget
                0.34, // w[13]: stability on forget
                1.26, // w[14]: retrievability on forget
                0.29, // w[15]: hard penalty
                2.61, // w[16]: easy bonus
            ],
        }
    }
}

/// FSRS scheduler. Construct once at startup and share by reference.
#[derive(Debug, Clone, Default)]
pub struct Fsrs {
    config: SchedulerConfig,
}

impl Fsrs {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Compute the state after grading a card at `review_time`.
    ///
    /// Pure and deterministic; the caller supplies the clock. Reviewing
    /// before `state.due` is legal and dampens the stability gain.
    pub fn schedule(
        &self,
        state: &CardState,
        grade: Grade,
        review_time: DateTime<Utc>,
    ) -> Result<CardState, SchedulerError> {
        state.validate()?;

        let elapsed_days = match state.last_review {
            Some(last) => days_between(last, review_time).max(0.0),
            None => 0.0,
        };

        let (stability, difficulty, status, lapses) = if state.status == CardStatus::New {
            self.first_review(grade, state.lapses)
        } else {
            self.subsequent_review(state, grade, elapsed_days)
        };

        let scheduled_days = match status {
            CardStatus::Learning | CardStatus::Relearning => self.learning_interval(stability),
            _ => self.interval_from_stability(stability),
        };
        let due = review_time + Duration::seconds((scheduled_days * 86_400.0) as i64);

        Ok(CardState {
            status,
            due,
            stability,
            difficulty,
            elapsed_days,
            scheduled_days,
            reps: state.reps + 1,
            lapses,
            last_review: Some(review_time),
        })
    }

    /// Retrievability: probability of recall after `elapsed_days`.
    /// R = (1 + t / (9 * S))^(-1), so R(S, S) = 0.9.
    pub fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64 {
        if stability < STABILITY_EPSILON {
            return 0.0;
        }
        let factor = 1.0 + elapsed_days / (9.0 * stability);
        factor.powf(-1.0)
    }

    /// Current recall estimate for a card. Never-reviewed cards have not been
    /// exposed to forgetting yet and report 1.0.
    pub fn retention(&self, state: &CardState, now: DateTime<Utc>) -> f64 {
        if state.status == CardStatus::New {
            return 1.0;
        }
        let elapsed = match state.last_review {
            Some(last) => days_between(last, now).max(0.0),
            None => 0.0,
        };
        self.retrievability(elapsed, state.stability)
    }

    /// First review: initialize stability and difficulty from the grade.
    /// Easy skips the learning phase entirely.
    fn first_review(&self, grade: Grade, lapses: u32) -> (f64, f64, CardStatus, u32) {
        let stability = self.initial_stability(grade);
        let difficulty = self.initial_difficulty(grade);
        let status = match grade {
            Grade::Easy => CardStatus::Review,
            _ => CardStatus::Learning,
        };
        (stability, difficulty, status, lapses)
    }

    /// Subsequent review: update stability, difficulty and lifecycle stage.
    /// The lapse counter only moves on the Review -> Relearning edge.
    fn subsequent_review(
        &self,
        state: &CardState,
        grade: Grade,
        elapsed_days: f64,
    ) -> (f64, f64, CardStatus, u32) {
        let retrievability = self.retrievability(elapsed_days, state.stability);
        let difficulty = self.next_difficulty(state.difficulty, grade);

        let (stability, status, lapses) = match (state.status, grade) {
            (CardStatus::Review, Grade::Again) => (
                self.next_stability_forget(state.stability, state.difficulty, retrievability),
                CardStatus::Relearning,
                state.lapses + 1,
            ),
            (CardStatus::Review, _) => (
                self.next_stability_recall(
                    state.stability,
                    state.difficulty,
                    retrievability,
                    grade,
                ),
                CardStatus::Review,
                state.lapses,
            ),
            (_, Grade::Again) => (
                self.next_stability_forget(state.stability, state.difficulty, retrievability),
                state.status,
                state.lapses,
            ),
            (_, Grade::Hard) => (
                self.next_stability_recall(
                    state.stability,
                    state.difficulty,
                    retrievability,
                    grade,
                ),
                state.status,
                state.lapses,
            ),
            (_, _) => (
                self.next_stability_recall(
                    state.stability,
                    state.difficulty,
                    retrievability,
                    grade,
                ),
                CardStatus::Review,
                state.lapses,
            ),
        };

        (stability, difficulty, status, lapses)
    }

    /// Initial stability for a new card: S0(G) = w[G-1].
    fn initial_stability(&self, grade: Grade) -> f64 {
        self.config.weights[grade.index()].max(MIN_STABILITY)
    }

    /// Initial difficulty: D0(G) = w[4] - w[5] * (G - 3).
    fn initial_difficulty(&self, grade: Grade) -> f64 {
        let g = grade.to_value() as f64;
        let d0 = self.config.weights[4] - self.config.weights[5] * (g - 3.0);
        d0.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Mean reversion toward the grade's initial difficulty, then decay:
    /// D' = w[7] * D0(G) + (1 - w[7]) * D, D'' = D' - w[6] * (G - 3).
    fn next_difficulty(&self, current: f64, grade: Grade) -> f64 {
        let w = &self.config.weights;
        let g = grade.to_value() as f64;
        let reverted = w[7] * self.initial_difficulty(grade) + (1.0 - w[7]) * current;
        (reverted - w[6] * (g - 3.0)).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Stability after successful recall:
    /// S' = S * (1 + e^(w[8]) * (11 - D) * S^(-w[9]) * (e^(w[10]*(1-R)) - 1) * modifier)
    /// where modifier is the hard penalty or easy bonus.
    fn next_stability_recall(
        &self,
        stability: f64,
        difficulty: f64,
        retrievability: f64,
        grade: Grade,
    ) -> f64 {
        let w = &self.config.weights;
        let modifier = match grade {
            Grade::Hard => w[15],
            Grade::Easy => w[16],
            _ => 1.0,
        };
        let growth = w[8].exp()
            * (11.0 - difficulty).max(0.1)
            * stability.powf(-w[9])
            * ((w[10] * (1.0 - retrievability)).exp() - 1.0)
            * modifier;

        (stability * (1.0 + growth))
            .max(MIN_STABILITY)
            .min(self.config.maximum_interval)
    }

    /// Stability after forgetting:
    /// S' = w[11] * D^(-w[12]) * ((S+1)^w[13] - 1) * e^(w[14]*(1-R)).
    /// Never exceeds the previous stability.
    fn next_stability_forget(&self, stability: f64, difficulty: f64, retrievability: f64) -> f64 {
        let w = &self.config.weights;
        let new_s = w[11]
            * difficulty.max(1.0).powf(-w[12])
            * ((stability + 1.0).powf(w[13]) - 1.0)
            * (w[14] * (1.0 - retrievability)).exp();

        new_s.max(MIN_STABILITY).min(stability)
    }

    /// Interval solving retention(t, S) = request_retention:
    /// I = 9 * S * (1/R - 1), clamped to [1, maximum_interval].
    fn interval_from_stability(&self, stability: f64) -> f64 {
        let retention = self.config.request_retention;
        if retention <= 0.0 || retention >= 1.0 {
            return stability.min(self.config.maximum_interval);
        }
        let interval = 9.0 * stability * (1.0 / retention - 1.0);
        interval.max(1.0).min(self.config.maximum_interval)
    }

    /// Re-presentation interval while in a learning phase: minutes-to-hours
    /// scale, derived from stability, capped at one day.
    fn learning_interval(&self, stability: f64) -> f64 {
        let minutes = (stability * 60.0).clamp(10.0, 1440.0);
        minutes / 1440.0
    }
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 86_400.0
}
