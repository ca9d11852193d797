// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser sign-in and sign-out routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_session_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::routes::api::UserResponse;
use crate::services::google_oidc::OidcError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", post(google_sign_in))
        .route("/auth/logout", post(logout))
}

/// Body posted by Google Identity Services.
#[derive(Deserialize)]
pub struct GoogleSignInRequest {
    /// Google-issued ID token
    credential: String,
}

/// Sign in with a Google ID token; creates the user on first sign-in.
async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<GoogleSignInRequest>,
) -> Result<(CookieJar, Json<UserResponse>)> {
    let identity = state
        .google_verifier
        .verify_id_token(&body.credential)
        .await
        .map_err(|err| match err {
            OidcError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Rejected Google sign-in");
                AppError::unauthorized("Invalid Google credential")
            }
            OidcError::Transient(reason) => {
                AppError::Internal(anyhow::anyhow!("Google key fetch failed: {}", reason))
            }
        })?;

    let user = state.db.get_or_create_user(identity.into_new_user()).await?;

    let jwt = create_session_jwt(&user.email, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build();

    tracing::info!(user_id = %user.id, "User signed in");

    Ok((jar.add(cookie), Json(user.into())))
}

/// Sign out by expiring the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = Cookie::build(SESSION_COOKIE).path("/").build();
    (jar.remove(removal), StatusCode::NO_CONTENT)
}
