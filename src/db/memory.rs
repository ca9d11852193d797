// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent maps.

use crate::models::{ActivityRecord, User};
use dashmap::DashMap;

/// Users keyed by email, activity logs keyed by owning user ID.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    activities: DashMap<String, Vec<ActivityRecord>>,
}

impl MemoryStore {
    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users.get(email).map(|u| u.value().clone())
    }

    /// Insert `user` unless its email is already taken; return the stored user.
    pub fn get_or_insert_user(&self, user: User) -> User {
        let email = user.email.clone();
        let entry = self.users.entry(email).or_insert_with(|| {
            tracing::info!(user_id = %user.id, provider = %user.provider, "Created user");
            user
        });
        entry.value().clone()
    }

    pub fn insert_activity(&self, record: ActivityRecord) {
        self.activities
            .entry(record.user_id.clone())
            .or_default()
            .push(record);
    }

    pub fn list_recent_activities(&self, user_id: &str, limit: usize) -> Vec<ActivityRecord> {
        let Some(records) = self.activities.get(user_id) else {
            return Vec::new();
        };

        let mut records = records.value().clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        records
    }
}
