// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the event store and user lookups.
//!
//! [`Database`] is acquired once at startup and shared through `AppState`.
//! It dispatches to Firestore in production or to an in-process store for
//! local development and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use crate::models::{ActivityRecord, NewActivity, NewUser, User};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ACTIVITY_LOGS: &str = "activity_logs";
}

/// Upper bound on records returned by a single read.
pub const MAX_RECENT_ACTIVITIES: u32 = 100;

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreDb),
    Memory(Arc<MemoryStore>),
}

/// Handle to the configured store.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

impl Database {
    /// Connect to the backend selected in `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.storage_backend {
            StorageBackend::Firestore => {
                let db = FirestoreDb::new(&config.gcp_project_id).await?;
                Ok(Self {
                    backend: Backend::Firestore(db),
                })
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Ok(Self::in_memory())
            }
        }
    }

    /// Create an empty in-process store.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Look up a user by email (the identity key).
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.find_user_by_email(email).await,
            Backend::Memory(store) => Ok(store.find_user_by_email(email)),
        }
    }

    /// Return the user with this email, creating it on first sign-in.
    ///
    /// An existing user is returned unchanged: the provider binding recorded
    /// at creation is never overwritten.
    pub async fn get_or_create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let now = format_utc_rfc3339(Utc::now());
        let candidate = User {
            id: new_document_id()?,
            email: new_user.email,
            name: new_user.name,
            image: new_user.image,
            provider: new_user.provider,
            provider_id: new_user.provider_id,
            created_at: now.clone(),
            updated_at: now,
        };

        match &self.backend {
            Backend::Firestore(db) => {
                if let Some(existing) = db.find_user_by_email(&candidate.email).await? {
                    return Ok(existing);
                }
                db.insert_user(&candidate).await?;
                tracing::info!(user_id = %candidate.id, provider = %candidate.provider, "Created user");
                Ok(candidate)
            }
            Backend::Memory(store) => Ok(store.get_or_insert_user(candidate)),
        }
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Persist one validated activity for `user_id`.
    pub async fn create_activity(
        &self,
        user_id: &str,
        activity: NewActivity,
    ) -> Result<ActivityRecord, AppError> {
        let record = build_record(new_document_id()?, user_id, activity, Utc::now());

        match &self.backend {
            Backend::Firestore(db) => db.insert_activity(&record).await?,
            Backend::Memory(store) => store.insert_activity(record.clone()),
        }

        Ok(record)
    }

    /// Most recent activities for `user_id`, newest event first.
    ///
    /// `limit` is clamped to [`MAX_RECENT_ACTIVITIES`].
    pub async fn list_recent_activities(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let limit = limit.min(MAX_RECENT_ACTIVITIES);

        match &self.backend {
            Backend::Firestore(db) => db.list_recent_activities(user_id, limit).await,
            Backend::Memory(store) => Ok(store.list_recent_activities(user_id, limit as usize)),
        }
    }
}

fn build_record(
    id: String,
    user_id: &str,
    activity: NewActivity,
    now: DateTime<Utc>,
) -> ActivityRecord {
    ActivityRecord {
        id,
        user_id: user_id.to_string(),
        timestamp: activity.timestamp,
        payload: activity.payload,
        created_at: now,
        updated_at: now,
    }
}

/// Random 96-bit document ID, hex encoded.
pub fn new_document_id() -> Result<String, AppError> {
    let mut bytes = [0u8; 12];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;
    Ok(hex::encode(bytes))
}
