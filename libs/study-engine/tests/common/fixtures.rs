//! Factory functions for creating test data.

use chrono::{DateTime, Duration, TimeZone, Utc};
use srs_core::{CardState, CardStatus, Grade};
use study_engine::storage::{CatalogCard, ReviewLogEntry, SchedulingRecord};
use uuid::Uuid;

/// Fixed session start used across the engine tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

pub fn user() -> Uuid {
    Uuid::from_u128(1)
}

/// Catalog of `n` plain cards with ids 1..=n.
pub fn catalog(n: usize) -> Vec<CatalogCard> {
    (1..=n as i64).map(|id| card(id, "skeletal", &[], None)).collect()
}

pub fn card(id: i64, category: &str, tags: &[&str], structure_id: Option<&str>) -> CatalogCard {
    CatalogCard {
        id,
        category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        structure_id: structure_id.map(Into::into),
    }
}

/// A mature Review-state record due at `due`.
pub fn review_record(
    user_id: Uuid,
    card_id: i64,
    due: DateTime<Utc>,
    stability: f64,
    difficulty: f64,
) -> SchedulingRecord {
    let mut record = SchedulingRecord::new(user_id, card_id, due);
    record.state = CardState {
        status: CardStatus::Review,
        due,
        stability,
        difficulty,
        elapsed_days: stability,
        scheduled_days: stability,
        reps: 3,
        lapses: 0,
        last_review: Some(due - Duration::days(stability.max(1.0) as i64)),
    };
    record.total_reviews = 3;
    record.total_correct = 3;
    record.interval = stability.round() as i64;
    record
}

/// One review-log row; incorrect entries are graded Again.
pub fn log_entry(
    user_id: Uuid,
    card_id: i64,
    reviewed_at: DateTime<Utc>,
    correct: bool,
) -> ReviewLogEntry {
    ReviewLogEntry {
        user_id,
        card_id,
        reviewed_at,
        grade: if correct { Grade::Good } else { Grade::Again },
        was_correct: correct,
        time_taken_ms: Some(3_000),
    }
}
