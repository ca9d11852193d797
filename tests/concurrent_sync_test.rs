// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chronos_server::db::Database;
use chronos_server::services::ingest::ingest_batch;
use serde_json::{json, Value};

const NUM_CONCURRENT_BATCHES: usize = 8;
const ENTRIES_PER_BATCH: usize = 10;

fn batch(worker: usize) -> Vec<Value> {
    (0..ENTRIES_PER_BATCH)
        .map(|i| {
            json!({
                "type": "window",
                "timestamp": format!("2024-01-01T{:02}:{:02}:00Z", worker, i),
                "data": { "processName": format!("worker-{worker}"), "windowTitle": "Busy" }
            })
        })
        .collect()
}

#[tokio::test]
async fn test_concurrent_batches_for_one_user_all_land() {
    // Several collectors for the same user syncing at once must not lose writes.
    let db = Database::in_memory();
    let user_id = "concurrent-user";

    let mut handles = vec![];
    for worker in 0..NUM_CONCURRENT_BATCHES {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            ingest_batch(&db, user_id, &batch(worker)).await
        }));
    }

    for handle in handles {
        let outcome = handle.await.expect("Task panicked");
        assert_eq!(outcome.saved, ENTRIES_PER_BATCH);
        assert!(outcome.skipped.is_empty());
    }

    let stored = db.list_recent_activities(user_id, 100).await.unwrap();
    assert_eq!(stored.len(), NUM_CONCURRENT_BATCHES * ENTRIES_PER_BATCH);

    let mut ids: Vec<_> = stored.iter().map(|r| r.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), stored.len(), "document IDs must be unique");

    assert!(stored.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[tokio::test]
async fn test_concurrent_batches_for_different_users_stay_separate() {
    let db = Database::in_memory();

    let mut handles = vec![];
    for worker in 0..NUM_CONCURRENT_BATCHES {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let user_id = format!("user-{worker}");
            ingest_batch(&db, &user_id, &batch(worker)).await
        }));
    }
    for handle in handles {
        handle.await.expect("Task panicked");
    }

    for worker in 0..NUM_CONCURRENT_BATCHES {
        let stored = db
            .list_recent_activities(&format!("user-{worker}"), 100)
            .await
            .unwrap();
        assert_eq!(stored.len(), ENTRIES_PER_BATCH);
    }
}
