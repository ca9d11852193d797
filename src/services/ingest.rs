// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity log ingestion.
//!
//! A batch is a sequence of independent writes. Each entry is validated and
//! persisted on its own, in array order; a bad entry is logged and skipped and
//! never undoes or blocks its siblings. There is no batch transaction and no
//! deduplication, so a retried batch stores its entries again.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{ActivityRecord, NewActivity};
use serde_json::Value;

/// Why one batch entry was not stored.
#[derive(Debug)]
pub struct SkippedEntry {
    pub index: usize,
    pub reason: AppError,
}

/// Result of ingesting one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub saved: usize,
    pub total: usize,
    /// Server-side diagnostics only; never sent to the client.
    pub skipped: Vec<SkippedEntry>,
}

impl BatchOutcome {
    fn record(mut self, index: usize, result: Result<ActivityRecord>) -> Self {
        self.total += 1;
        match result {
            Ok(_) => self.saved += 1,
            Err(reason) => {
                tracing::warn!(index, reason = %reason, "Skipping activity log entry");
                self.skipped.push(SkippedEntry { index, reason });
            }
        }
        self
    }
}

/// Validate and persist one entry for `user_id`.
pub async fn ingest_entry(db: &Database, user_id: &str, entry: &Value) -> Result<ActivityRecord> {
    let activity = NewActivity::from_entry(entry)?;
    db.create_activity(user_id, activity).await
}

/// Ingest a batch of raw entries for `user_id`, strictly in order.
pub async fn ingest_batch(db: &Database, user_id: &str, entries: &[Value]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for (index, entry) in entries.iter().enumerate() {
        let result = ingest_entry(db, user_id, entry).await;
        outcome = outcome.record(index, result);
    }

    tracing::info!(
        user_id,
        saved = outcome.saved,
        total = outcome.total,
        skipped = outcome.skipped.len(),
        "Batch ingested"
    );

    outcome
}
