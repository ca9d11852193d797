// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage, looked up by email)
//! - Activity logs (one document per event, queried by owner and event time)
//!
//! Listing activity logs needs a composite index on
//! `activity_logs(user_id ASC, timestamp DESC)`.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ActivityData, ActivityKind, ActivityPayload, ActivityRecord, User};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Activity log as laid out in Firestore.
///
/// Times are fixed-width RFC3339 strings so ordering on `timestamp` is
/// chronological.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivityDocument {
    id: String,
    user_id: String,
    timestamp: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: ActivityData,
    created_at: String,
    updated_at: String,
}

impl From<&ActivityRecord> for ActivityDocument {
    fn from(record: &ActivityRecord) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.user_id.clone(),
            timestamp: format_utc_rfc3339(record.timestamp),
            kind: record.kind().as_str().to_string(),
            data: record.payload.to_data(),
            created_at: format_utc_rfc3339(record.created_at),
            updated_at: format_utc_rfc3339(record.updated_at),
        }
    }
}

impl TryFrom<ActivityDocument> for ActivityRecord {
    type Error = String;

    fn try_from(doc: ActivityDocument) -> Result<Self, Self::Error> {
        let parse = |field: &str, raw: &str| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("bad {field} `{raw}`: {e}"))
        };

        let kind: ActivityKind = doc.kind.parse().map_err(|e| format!("{e}"))?;
        let payload = ActivityPayload::from_parts(kind, doc.data).map_err(|e| format!("{e}"))?;

        Ok(ActivityRecord {
            timestamp: parse("timestamp", &doc.timestamp)?,
            created_at: parse("created_at", &doc.created_at)?,
            updated_at: parse("updated_at", &doc.updated_at)?,
            id: doc.id,
            user_id: doc.user_id,
            payload,
        })
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Find a user by email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// Insert a new user document. Fails if the ID is already taken.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let _: User = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Insert one activity log document.
    pub async fn insert_activity(&self, record: &ActivityRecord) -> Result<(), AppError> {
        let doc = ActivityDocument::from(record);

        let _: ActivityDocument = self
            .client
            .fluent()
            .insert()
            .into(collections::ACTIVITY_LOGS)
            .document_id(&doc.id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the newest activity logs for a user.
    pub async fn list_recent_activities(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let docs: Vec<ActivityDocument> = self
            .client
            .fluent()
            .select()
            .from(collections::ACTIVITY_LOGS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let records = docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                match ActivityRecord::try_from(doc) {
                    Ok(record) => Some(record),
                    Err(reason) => {
                        tracing::warn!(doc_id = %id, reason = %reason, "Skipping unreadable activity log");
                        None
                    }
                }
            })
            .collect();

        Ok(records)
    }
}
