// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collector sync route (bearer sync token).

use crate::error::{AppError, Result};
use crate::services::ingest::ingest_batch;
use crate::services::sync_token::CollectorIdentity;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Collectors that were offline for a while upload large backlogs.
const SYNC_BODY_LIMIT: usize = 16 * 1024 * 1024;

const LOGS_MUST_BE_ARRAY: &str = "Logs must be an array";

/// Sync routes (require a collector sync token).
/// The token middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sync", post(sync_logs))
        .layer(DefaultBodyLimit::max(SYNC_BODY_LIMIT))
}

/// Sync response. Only counts; which entries failed is logged server-side.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncResponse {
    pub message: String,
    pub saved: usize,
    pub total: usize,
}

/// Ingest a batch of activity logs from the desktop collector.
async fn sync_logs(
    State(state): State<Arc<AppState>>,
    Extension(collector): Extension<CollectorIdentity>,
    body: Bytes,
) -> Result<Json<SyncResponse>> {
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(user_id = %collector.user_id, error = %e, "Sync body is not JSON");
        AppError::BadRequest(LOGS_MUST_BE_ARRAY.to_string())
    })?;

    let logs = body
        .get("logs")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::BadRequest(LOGS_MUST_BE_ARRAY.to_string()))?;

    tracing::debug!(
        user_id = %collector.user_id,
        entries = logs.len(),
        "Sync batch received"
    );

    let outcome = ingest_batch(&state.db, &collector.user_id, logs).await;

    Ok(Json(SyncResponse {
        message: "Logs synced successfully".to_string(),
        saved: outcome.saved,
        total: outcome.total,
    }))
}
