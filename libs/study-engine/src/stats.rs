//! Read-only statistics rollups over persisted state and session history.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use srs_core::{CardStatus, Fsrs};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::{CatalogCard, StateStore};

/// Bucket boundaries and windows for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Difficulty below this counts as "easy".
    pub easy_below: f64,
    /// Difficulty at or above this counts as "hard"; in between is "medium".
    pub hard_from: f64,
    /// Window for the rolling average-retention estimate, in days.
    pub retention_window_days: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            easy_below: 5.0,
            hard_from: 7.0,
            retention_window_days: 30,
        }
    }
}

/// One calendar day of study activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub reviewed: usize,
    pub correct: usize,
    pub study_time_ms: i64,
}

/// Seven consecutive days of study activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub reviewed: usize,
    pub correct: usize,
    pub study_time_ms: i64,
}

/// Consecutive-day study streaks derived from session history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Streaks {
    pub current: usize,
    pub longest: usize,
}

/// Cards coming due on one future calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub due: usize,
}

/// Card counts per lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaturityBreakdown {
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub relearning: usize,
}

/// Accuracy within one card category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAccuracy {
    pub category: String,
    pub reviewed: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Accuracy within one difficulty bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketAccuracy {
    pub reviewed: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Accuracy broken down by current card difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyAccuracy {
    pub easy: BucketAccuracy,
    pub medium: BucketAccuracy,
    pub hard: BucketAccuracy,
}

/// Read-only consumer of the state store and the review log. Never writes.
pub struct StatsAggregator<'a, S: StateStore + ?Sized> {
    store: &'a S,
    scheduler: &'a Fsrs,
    config: StatsConfig,
}

impl<'a, S: StateStore + ?Sized> StatsAggregator<'a, S> {
    pub fn new(store: &'a S, scheduler: &'a Fsrs, config: StatsConfig) -> Self {
        Self {
            store,
            scheduler,
            config,
        }
    }

    /// Reviewed/correct counts and study time for each of the last `days`
    /// calendar days, oldest first. Days without activity are zero-filled.
    pub async fn daily_summaries(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        days: usize,
    ) -> Result<Vec<DailySummary>> {
        let log = self.store.fetch_review_log(user_id).await?;

        let mut by_date: HashMap<NaiveDate, (usize, usize, i64)> = HashMap::new();
        for entry in &log {
            let slot = by_date.entry(entry.reviewed_at.date_naive()).or_default();
            slot.0 += 1;
            if entry.was_correct {
                slot.1 += 1;
            }
            slot.2 += entry.time_taken_ms.unwrap_or(0);
        }

        let summaries = (0..days)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset as i64);
                let (reviewed, correct, study_time_ms) =
                    by_date.get(&date).copied().unwrap_or_default();
                DailySummary {
                    date,
                    reviewed,
                    correct,
                    study_time_ms,
                }
            })
            .collect();

        debug!(days, "aggregated daily summaries");
        Ok(summaries)
    }

    /// Seven-day rollups of the daily series, oldest week first.
    pub async fn weekly_summaries(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        weeks: usize,
    ) -> Result<Vec<WeeklySummary>> {
        let daily = self.daily_summaries(user_id, today, weeks * 7).await?;

        Ok(daily
            .chunks(7)
            .map(|week| WeeklySummary {
                week_start: week[0].date,
                reviewed: week.iter().map(|d| d.reviewed).sum(),
                correct: week.iter().map(|d| d.correct).sum(),
                study_time_ms: week.iter().map(|d| d.study_time_ms).sum(),
            })
            .collect())
    }

    /// Mean predicted recall over cards reviewed inside the rolling window,
    /// with elapsed time measured from each card's due date (cards not yet
    /// due sit at their target-retention ceiling). 0.0 when nothing has been
    /// reviewed yet.
    pub async fn average_retention(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<f64> {
        let window = Duration::days(self.config.retention_window_days);
        let records = self.store.fetch_all_for_user(user_id).await?;

        let retentions: Vec<f64> = records
            .iter()
            .filter(|r| r.state.status != CardStatus::New)
            .filter(|r| {
                r.state
                    .last_review
                    .is_some_and(|last| now - last <= window)
            })
            .map(|r| {
                let elapsed = (now - r.state.due).num_seconds() as f64 / 86_400.0;
                self.scheduler
                    .retrievability(elapsed.max(0.0), r.state.stability)
            })
            .collect();

        if retentions.is_empty() {
            return Ok(0.0);
        }
        Ok(retentions.iter().sum::<f64>() / retentions.len() as f64)
    }

    /// Current and longest consecutive-day streaks. The current streak
    /// tolerates today having no reviews yet.
    pub async fn streaks(&self, user_id: Uuid, today: NaiveDate) -> Result<Streaks> {
        let log = self.store.fetch_review_log(user_id).await?;
        let dates: BTreeSet<NaiveDate> =
            log.iter().map(|e| e.reviewed_at.date_naive()).collect();

        let mut longest = 0usize;
        let mut run = 0usize;
        let mut previous: Option<NaiveDate> = None;
        for &date in &dates {
            run = match previous {
                Some(prev) if prev.succ_opt() == Some(date) => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            previous = Some(date);
        }

        let mut current = 0usize;
        let mut cursor = if dates.contains(&today) {
            Some(today)
        } else {
            today.pred_opt()
        };
        while let Some(date) = cursor {
            if !dates.contains(&date) {
                break;
            }
            current += 1;
            cursor = date.pred_opt();
        }

        Ok(Streaks { current, longest })
    }

    /// Cards coming due on each of the next `days` calendar days, starting
    /// today. Already-overdue cards fold into the first day.
    pub async fn forecast(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        days: usize,
    ) -> Result<Vec<ForecastDay>> {
        let today = now.date_naive();
        let records = self.store.fetch_all_for_user(user_id).await?;

        let mut counts = vec![0usize; days];
        for record in records
            .iter()
            .filter(|r| r.state.status != CardStatus::New)
        {
            let due_date = record.state.due.date_naive().max(today);
            let offset = (due_date - today).num_days();
            if (offset as usize) < days {
                counts[offset as usize] += 1;
            }
        }

        Ok(counts
            .into_iter()
            .enumerate()
            .map(|(offset, due)| ForecastDay {
                date: today + Duration::days(offset as i64),
                due,
            })
            .collect())
    }

    /// Card counts per lifecycle stage. "New" is the catalog remainder:
    /// cards with no persisted record at all.
    pub async fn maturity(&self, user_id: Uuid) -> Result<MaturityBreakdown> {
        let records = self.store.fetch_all_for_user(user_id).await?;
        let catalog = self.store.catalog_count().await?;

        let mut breakdown = MaturityBreakdown {
            new: catalog.saturating_sub(records.len()),
            learning: 0,
            review: 0,
            relearning: 0,
        };
        for record in &records {
            match record.state.status {
                CardStatus::New => breakdown.new += 1,
                CardStatus::Learning => breakdown.learning += 1,
                CardStatus::Review => breakdown.review += 1,
                CardStatus::Relearning => breakdown.relearning += 1,
            }
        }
        Ok(breakdown)
    }

    /// Accuracy per card category, sorted by category name. Log entries for
    /// cards no longer in the catalog are skipped.
    pub async fn accuracy_by_category(
        &self,
        user_id: Uuid,
        catalog: &[CatalogCard],
    ) -> Result<Vec<CategoryAccuracy>> {
        let categories: HashMap<i64, &str> = catalog
            .iter()
            .map(|c| (c.id, c.category.as_str()))
            .collect();
        let log = self.store.fetch_review_log(user_id).await?;

        let mut tallies: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for entry in &log {
            let Some(&category) = categories.get(&entry.card_id) else {
                continue;
            };
            let slot = tallies.entry(category).or_default();
            slot.0 += 1;
            if entry.was_correct {
                slot.1 += 1;
            }
        }

        Ok(tallies
            .into_iter()
            .map(|(category, (reviewed, correct))| CategoryAccuracy {
                category: category.to_string(),
                reviewed,
                correct,
                accuracy: ratio(correct, reviewed),
            })
            .collect())
    }

    /// Accuracy per difficulty bucket, bucketing each log entry by the
    /// card's current difficulty.
    pub async fn accuracy_by_difficulty(&self, user_id: Uuid) -> Result<DifficultyAccuracy> {
        let records = self.store.fetch_all_for_user(user_id).await?;
        let difficulties: HashMap<i64, f64> = records
            .iter()
            .map(|r| (r.card_id, r.state.difficulty))
            .collect();
        let log = self.store.fetch_review_log(user_id).await?;

        let mut buckets = [(0usize, 0usize); 3];
        for entry in &log {
            let Some(&difficulty) = difficulties.get(&entry.card_id) else {
                continue;
            };
            let bucket = if difficulty < self.config.easy_below {
                0
            } else if difficulty < self.config.hard_from {
                1
            } else {
                2
            };
            buckets[bucket].0 += 1;
            if entry.was_correct {
                buckets[bucket].1 += 1;
            }
        }

        let to_accuracy = |(reviewed, correct): (usize, usize)| BucketAccuracy {
            reviewed,
            correct,
            accuracy: ratio(correct, reviewed),
        };
        Ok(DifficultyAccuracy {
            easy: to_accuracy(buckets[0]),
            medium: to_accuracy(buckets[1]),
            hard: to_accuracy(buckets[2]),
        })
    }
}

fn ratio(correct: usize, reviewed: usize) -> f64 {
    if reviewed == 0 {
        return 0.0;
    }
    correct as f64 / reviewed as f64
}
