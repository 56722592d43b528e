//! Review queue construction.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::{CatalogCard, StateStore};

/// Caps and filters for building a study queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueOptions {
    /// Maximum new cards introduced per session.
    pub new_per_day: usize,
    /// Maximum due cards reviewed per session.
    pub max_reviews: usize,
    /// Keep only cards carrying at least one of these tags.
    pub tags: Option<Vec<String>>,
    /// Keep only cards anchored to one of these structure ids.
    pub structures: Option<Vec<String>>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            new_per_day: 20,
            max_reviews: 100,
            tags: None,
            structures: None,
        }
    }
}

/// Ordered card ids plus a cursor. Ephemeral: rebuilt each session, never
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct ReviewQueue {
    entries: Vec<i64>,
    cursor: usize,
}

impl ReviewQueue {
    pub fn new(entries: Vec<i64>) -> Self {
        Self { entries, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Card under the cursor, or None once the queue is exhausted.
    pub fn current(&self) -> Option<i64> {
        self.entries.get(self.cursor).copied()
    }

    /// Move the cursor forward and return the card now under it.
    pub fn advance(&mut self) -> Option<i64> {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Move the cursor back and return the card now under it.
    pub fn retreat(&mut self) -> Option<i64> {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        self.current()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn card_ids(&self) -> &[i64] {
        &self.entries
    }
}

/// Build the ordered queue for a study session.
///
/// Due cards come first, most overdue leading, truncated to `max_reviews`;
/// unseen catalog cards follow in catalog order, truncated to `new_per_day`.
/// Filters restrict both sets before truncation. Caps of 0 are legal and an
/// empty queue is a legal result.
pub async fn build_queue<S: StateStore + ?Sized>(
    store: &S,
    user_id: Uuid,
    catalog: &[CatalogCard],
    now: DateTime<Utc>,
    options: &QueueOptions,
) -> Result<ReviewQueue> {
    let by_id: HashMap<i64, &CatalogCard> = catalog.iter().map(|c| (c.id, c)).collect();

    // Due set: the store returns status != New, due <= now, most overdue
    // first. Cards no longer in the catalog are skipped.
    let due: Vec<i64> = store
        .fetch_due(user_id, now)
        .await?
        .into_iter()
        .map(|record| record.card_id)
        .filter(|id| by_id.get(id).is_some_and(|c| matches_filters(c, options)))
        .take(options.max_reviews)
        .collect();

    let seen: HashSet<i64> = store
        .fetch_all_for_user(user_id)
        .await?
        .into_iter()
        .map(|record| record.card_id)
        .collect();

    // New set: catalog order is the presentation order unless the caller
    // shuffles explicitly.
    let fresh: Vec<i64> = catalog
        .iter()
        .filter(|c| !seen.contains(&c.id) && matches_filters(c, options))
        .map(|c| c.id)
        .take(options.new_per_day)
        .collect();

    debug!(due = due.len(), new = fresh.len(), "built review queue");

    let mut entries = due;
    entries.extend(fresh);
    Ok(ReviewQueue::new(entries))
}

fn matches_filters(card: &CatalogCard, options: &QueueOptions) -> bool {
    if let Some(tags) = &options.tags {
        if !card.tags.iter().any(|tag| tags.contains(tag)) {
            return false;
        }
    }
    if let Some(structures) = &options.structures {
        match &card.structure_id {
            Some(id) if structures.contains(id) => {}
            _ => return false,
        }
    }
    true
}

/// Shuffle the queue for presentation variety. Opt-in: `build_queue` never
/// applies it, and a seeded `Rng` keeps tests deterministic.
pub fn shuffle<R: Rng>(queue: &mut ReviewQueue, rng: &mut R) {
    queue.entries.shuffle(rng);
}
