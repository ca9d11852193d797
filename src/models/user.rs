//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (also used as document ID)
    pub id: String,
    /// Email address, the identity key
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    pub image: Option<String>,
    /// OAuth provider that created this user ("google")
    pub provider: String,
    /// Subject ID assigned by the provider
    pub provider_id: String,
    /// When the user first signed in (ISO 8601)
    pub created_at: String,
    /// Last modification (ISO 8601)
    pub updated_at: String,
}

/// Profile asserted by a sign-in provider, used to create a `User` on first sign-in.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub provider: String,
    pub provider_id: String,
}
