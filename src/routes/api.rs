// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for signed-in browser sessions.

use crate::db::MAX_RECENT_ACTIVITIES;
use crate::error::{AppError, Result};
use crate::middleware::auth::SessionUser;
use crate::models::{ActivityRecord, User};
use crate::services::ingest::ingest_entry;
use crate::services::sync_token::issue_sync_token;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require a browser session).
/// The session middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/logs", get(get_logs).post(create_log))
        .route("/api/auth/token", post(create_sync_token))
}

/// Resolve the session's email to a stored user.
async fn session_user(state: &AppState, session: &SessionUser) -> Result<User> {
    state
        .db
        .find_user_by_email(&session.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub provider: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
            provider: user.provider,
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<UserResponse>> {
    let user = session_user(&state, &session).await?;
    Ok(Json(user.into()))
}

// ─── Activity Logs ───────────────────────────────────────────

#[derive(Deserialize)]
struct LogsQuery {
    /// Maximum number of records, capped at 100
    limit: Option<u32>,
}

/// Get the user's most recent activity logs, newest first.
async fn get_logs(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
    Query(params): Query<LogsQuery>,
) -> Result<Json<Vec<ActivityRecord>>> {
    let user = session_user(&state, &session).await?;
    let limit = params
        .limit
        .unwrap_or(MAX_RECENT_ACTIVITIES)
        .min(MAX_RECENT_ACTIVITIES);

    let records = state.db.list_recent_activities(&user.id, limit).await?;

    tracing::debug!(user_id = %user.id, count = records.len(), "Fetched activity logs");

    Ok(Json(records))
}

/// Record a single activity log from the browser.
async fn create_log(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<ActivityRecord>)> {
    let user = session_user(&state, &session).await?;

    let entry: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Body is not valid JSON: {e}")))?;

    let record = ingest_entry(&state.db, &user.id, &entry).await?;

    tracing::info!(
        user_id = %user.id,
        kind = %record.kind(),
        "Activity log created"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

// ─── Sync Token ──────────────────────────────────────────────

/// Sync token response.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub token: String,
    pub message: String,
}

/// Issue a sync token for the desktop collector.
///
/// Issuance is not recorded; every call mints a new, independent token.
async fn create_sync_token(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<TokenResponse>> {
    let user = session_user(&state, &session).await?;

    let token = issue_sync_token(&user, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(e.context("sync token creation failed")))?;

    tracing::info!(user_id = %user.id, "Issued sync token");

    Ok(Json(TokenResponse {
        token,
        message: "Token generated successfully. Paste it into the Chronos desktop client."
            .to_string(),
    }))
}
