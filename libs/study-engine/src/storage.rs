//! Storage contract between the engine and the persistence layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use srs_core::{CardState, Grade};
use uuid::Uuid;

/// Catalog entry: what the engine needs to build queues and break down
/// statistics. The full card content (names, media, pronunciation) stays in
/// the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogCard {
    pub id: i64,
    pub category: String,
    pub tags: Vec<String>,
    /// Anchor into the 3D structure explorer, when the card has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<String>,
}

/// Persisted scheduling record, one per user x card. Created lazily the
/// first time a card is presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRecord {
    pub user_id: Uuid,
    pub card_id: i64,
    #[serde(flatten)]
    pub state: CardState,
    pub total_reviews: u32,
    pub total_correct: u32,
    /// Legacy SM-2 field kept for display compatibility; unused by the math.
    pub ease_factor: f64,
    /// Rounded scheduled interval in days, for display.
    pub interval: i64,
}

impl SchedulingRecord {
    /// Record for a card about to be presented for the first time.
    pub fn new(user_id: Uuid, card_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            card_id,
            state: CardState::new(now),
            total_reviews: 0,
            total_correct: 0,
            ease_factor: 2.5,
            interval: 0,
        }
    }
}

/// One row of session history, appended per graded card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub user_id: Uuid,
    pub card_id: i64,
    pub reviewed_at: DateTime<Utc>,
    pub grade: Grade,
    pub was_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_ms: Option<i64>,
}

/// Read/write access to persisted scheduling data.
///
/// Implementations live in the embedding application. The engine never
/// retries a failed call: a silently dropped grade would corrupt the
/// learning history, so failures surface immediately.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Record for one card, if the card has ever been presented.
    async fn fetch_one(
        &self,
        user_id: Uuid,
        card_id: i64,
    ) -> anyhow::Result<Option<SchedulingRecord>>;

    /// Records with status != New and due <= now, ordered ascending by due.
    async fn fetch_due(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<SchedulingRecord>>;

    /// Every record for the user, in no particular order.
    async fn fetch_all_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<SchedulingRecord>>;

    /// Insert or replace the record for (user_id, card_id).
    async fn upsert(&self, record: &SchedulingRecord) -> anyhow::Result<()>;

    /// Append one row of session history.
    async fn append_review(&self, entry: &ReviewLogEntry) -> anyhow::Result<()>;

    /// Full session history for the user, ordered ascending by reviewed_at.
    async fn fetch_review_log(&self, user_id: Uuid) -> anyhow::Result<Vec<ReviewLogEntry>>;

    /// Number of cards in the catalog.
    async fn catalog_count(&self) -> anyhow::Result<usize>;
}
