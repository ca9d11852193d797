// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collector sync tokens.
//!
//! A sync token is a stateless HS256 JWT handed to the desktop collector. It
//! carries the owning user and a `type` claim that must be `rust-client`.
//! Issuance is not recorded and there is no revocation: a token is valid
//! until its absolute expiry.

use crate::error::AppError;
use crate::models::User;
use axum::http::HeaderValue;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Capability tag for collector tokens.
pub const COLLECTOR_TOKEN_TYPE: &str = "rust-client";

/// Sync tokens expire 30 days after issuance.
pub const SYNC_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Claims carried by a sync token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncClaims {
    pub user_id: String,
    pub email: String,
    #[serde(rename = "type")]
    pub token_type: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Claims as decoded before the capability check; every token signed with
/// our key decodes into this, whatever its type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnyClaims {
    #[serde(rename = "type", default)]
    token_type: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Identity extracted from a verified sync token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorIdentity {
    pub user_id: String,
    pub email: String,
}

/// Issue a sync token for `user`, valid for 30 days from now.
pub fn issue_sync_token(user: &User, signing_key: &[u8]) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    issue_sync_token_at(&user.id, &user.email, signing_key, now, SYNC_TOKEN_TTL_SECS)
}

/// Issue a sync token with an explicit issue time and lifetime.
pub fn issue_sync_token_at(
    user_id: &str,
    email: &str,
    signing_key: &[u8],
    issued_at: u64,
    ttl_secs: u64,
) -> anyhow::Result<String> {
    let claims = SyncClaims {
        user_id: user_id.to_string(),
        email: email.to_string(),
        token_type: COLLECTOR_TOKEN_TYPE.to_string(),
        iat: issued_at,
        exp: issued_at + ttl_secs,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify the `Authorization` header of a sync request.
pub fn verify_sync_token(
    auth_header: Option<&HeaderValue>,
    signing_key: &[u8],
) -> Result<CollectorIdentity, AppError> {
    let token = auth_header
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized(AppError::MISSING_AUTH_HEADER))?;

    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is absolute.
    validation.leeway = 0;

    let claims = decode::<AnyClaims>(token, &key, &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected sync token");
            AppError::unauthorized(AppError::INVALID_TOKEN)
        })?
        .claims;

    if claims.token_type.as_deref() != Some(COLLECTOR_TOKEN_TYPE) {
        tracing::warn!(token_type = ?claims.token_type, "Rejected sync token with wrong type");
        return Err(AppError::unauthorized(AppError::INVALID_TOKEN_TYPE));
    }

    match (claims.user_id, claims.email) {
        (Some(user_id), Some(email)) if !user_id.is_empty() => {
            Ok(CollectorIdentity { user_id, email })
        }
        _ => Err(AppError::unauthorized(AppError::INVALID_TOKEN)),
    }
}
