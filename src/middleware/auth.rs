// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication middleware for browser sessions and collector sync tokens.

use crate::error::AppError;
use crate::services::sync_token::verify_sync_token;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the browser session JWT.
pub const SESSION_COOKIE: &str = "chronos_session";

/// Capability tag for browser session tokens.
pub const SESSION_TOKEN_TYPE: &str = "session";

/// Session lifetime in seconds (30 days).
pub const SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject (user email)
    pub sub: String,
    /// Capability tag, always "session"
    #[serde(rename = "type")]
    pub token_type: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    pub iat: u64,
}

/// Browser session identity. Only the email is trusted; the user record is
/// looked up per request.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub email: String,
}

/// Middleware that requires a valid browser session (cookie or bearer header).
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(AppError::unauthorized("Not signed in")),
        }
    };

    let email = decode_session(&token, &state.config.jwt_signing_key)?;

    request.extensions_mut().insert(SessionUser { email });

    Ok(next.run(request).await)
}

/// Middleware that requires a collector sync token.
pub async fn require_sync_token(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = verify_sync_token(
        request.headers().get(header::AUTHORIZATION),
        &state.config.jwt_signing_key,
    )?;

    tracing::debug!(user_id = %identity.user_id, "Sync token accepted");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

fn decode_session(token: &str, signing_key: &[u8]) -> Result<String, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|_| AppError::unauthorized(AppError::INVALID_TOKEN))?
        .claims;

    if claims.token_type != SESSION_TOKEN_TYPE {
        return Err(AppError::unauthorized(AppError::INVALID_TOKEN_TYPE));
    }

    Ok(claims.sub)
}

/// Create a session JWT for a signed-in user.
pub fn create_session_jwt(email: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = SessionClaims {
        sub: email.to_string(),
        token_type: SESSION_TOKEN_TYPE.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
