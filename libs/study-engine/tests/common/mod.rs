//! Common test utilities for engine integration tests.
//!
//! Provides:
//! - MemoryStore, an in-memory StateStore with injectable write failures
//! - fixtures, factory functions for seeding records and history

#![allow(dead_code)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use srs_core::CardStatus;
use study_engine::storage::{ReviewLogEntry, SchedulingRecord, StateStore};
use uuid::Uuid;

/// In-memory StateStore. Writes can be made to fail for error-path tests.
#[derive(Default)]
pub struct MemoryStore {
    catalog_size: usize,
    records: Mutex<HashMap<(Uuid, i64), SchedulingRecord>>,
    log: Mutex<Vec<ReviewLogEntry>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new(catalog_size: usize) -> Self {
        Self {
            catalog_size,
            ..Default::default()
        }
    }

    pub fn seed_record(&self, record: SchedulingRecord) {
        self.records
            .lock()
            .expect("records lock")
            .insert((record.user_id, record.card_id), record);
    }

    pub fn seed_log(&self, entry: ReviewLogEntry) {
        self.log.lock().expect("log lock").push(entry);
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn record(&self, user_id: Uuid, card_id: i64) -> Option<SchedulingRecord> {
        self.records
            .lock()
            .expect("records lock")
            .get(&(user_id, card_id))
            .cloned()
    }

    pub fn log_len(&self) -> usize {
        self.log.lock().expect("log lock").len()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn fetch_one(
        &self,
        user_id: Uuid,
        card_id: i64,
    ) -> anyhow::Result<Option<SchedulingRecord>> {
        Ok(self
            .records
            .lock()
            .expect("records lock")
            .get(&(user_id, card_id))
            .cloned())
    }

    async fn fetch_due(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<SchedulingRecord>> {
        let mut due: Vec<SchedulingRecord> = self
            .records
            .lock()
            .expect("records lock")
            .values()
            .filter(|r| {
                r.user_id == user_id && r.state.status != CardStatus::New && r.state.due <= now
            })
            .cloned()
            .collect();
        due.sort_by_key(|r| r.state.due);
        Ok(due)
    }

    async fn fetch_all_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<SchedulingRecord>> {
        Ok(self
            .records
            .lock()
            .expect("records lock")
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert(&self, record: &SchedulingRecord) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("injected storage failure"));
        }
        self.records
            .lock()
            .expect("records lock")
            .insert((record.user_id, record.card_id), record.clone());
        Ok(())
    }

    async fn append_review(&self, entry: &ReviewLogEntry) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("injected storage failure"));
        }
        self.log.lock().expect("log lock").push(entry.clone());
        Ok(())
    }

    async fn fetch_review_log(&self, user_id: Uuid) -> anyhow::Result<Vec<ReviewLogEntry>> {
        let mut entries: Vec<ReviewLogEntry> = self
            .log
            .lock()
            .expect("log lock")
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.reviewed_at);
        Ok(entries)
    }

    async fn catalog_count(&self) -> anyhow::Result<usize> {
        Ok(self.catalog_size)
    }
}
