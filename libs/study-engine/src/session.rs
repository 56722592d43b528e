//! Study session orchestration.

use chrono::{DateTime, Utc};
use serde::Serialize;
use srs_core::{CardState, Fsrs, Grade};
use tracing::debug;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::queue::ReviewQueue;
use crate::storage::{ReviewLogEntry, SchedulingRecord, StateStore};

/// Counters accumulated over one study session. Session-level only: a crash
/// loses these, never the per-card scheduling progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub reviewed: u32,
    pub correct: u32,
    /// Tally indexed by grade: Again, Hard, Good, Easy.
    pub grade_tally: [u32; 4],
}

/// Drives a single study session over a prepared queue.
///
/// `submit_grade` is the sole durable mutator and a single atomic
/// read-compute-write unit per card. At most one session per user is
/// assumed; concurrent sessions would need caller-side serialization.
pub struct StudySession<'a, S: StateStore + ?Sized> {
    store: &'a S,
    scheduler: &'a Fsrs,
    user_id: Uuid,
    queue: ReviewQueue,
    started_at: DateTime<Utc>,
    shown_at: DateTime<Utc>,
    reviewed: u32,
    correct: u32,
    grade_tally: [u32; 4],
}

impl<'a, S: StateStore + ?Sized> StudySession<'a, S> {
    pub fn new(
        store: &'a S,
        scheduler: &'a Fsrs,
        user_id: Uuid,
        queue: ReviewQueue,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            scheduler,
            user_id,
            queue,
            started_at: now,
            shown_at: now,
            reviewed: 0,
            correct: 0,
            grade_tally: [0; 4],
        }
    }

    /// Card under the cursor.
    pub fn current_card(&self) -> Result<i64> {
        self.queue.current().ok_or(EngineError::EmptyQueue)
    }

    /// Grade the current card: schedule, persist, log, advance.
    ///
    /// The record is created lazily if the card has never been presented.
    /// Counters and the cursor only move after both writes succeed, so a
    /// storage failure leaves the session positioned to retry.
    pub async fn submit_grade(&mut self, grade: Grade, now: DateTime<Utc>) -> Result<CardState> {
        let card_id = self.current_card()?;

        let mut record = self
            .store
            .fetch_one(self.user_id, card_id)
            .await?
            .unwrap_or_else(|| SchedulingRecord::new(self.user_id, card_id, now));

        let new_state = self.scheduler.schedule(&record.state, grade, now)?;
        let was_correct = grade != Grade::Again;

        record.interval = new_state.scheduled_days.round() as i64;
        record.total_reviews += 1;
        if was_correct {
            record.total_correct += 1;
        }
        record.state = new_state.clone();

        self.store.upsert(&record).await?;
        self.store
            .append_review(&ReviewLogEntry {
                user_id: self.user_id,
                card_id,
                reviewed_at: now,
                grade,
                was_correct,
                time_taken_ms: Some((now - self.shown_at).num_milliseconds().max(0)),
            })
            .await?;

        debug!(card_id, grade = grade.to_value(), "persisted review");

        self.reviewed += 1;
        if was_correct {
            self.correct += 1;
        }
        self.grade_tally[grade.index()] += 1;
        self.shown_at = now;
        self.queue.advance();

        Ok(new_state)
    }

    /// Step forward without grading. Navigation only; nothing is persisted.
    pub fn next(&mut self) -> Option<i64> {
        self.queue.advance()
    }

    /// Step back without grading.
    pub fn previous(&mut self) -> Option<i64> {
        self.queue.retreat()
    }

    /// True once the cursor has passed the last card.
    pub fn is_finished(&self) -> bool {
        self.queue.current().is_none()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len() - self.queue.position()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            started_at: self.started_at,
            reviewed: self.reviewed,
            correct: self.correct,
            grade_tally: self.grade_tally,
        }
    }
}
