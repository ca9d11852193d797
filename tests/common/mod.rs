// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use chronos_server::config::Config;
use chronos_server::db::Database;
use chronos_server::middleware::auth::create_session_jwt;
use chronos_server::models::{NewUser, User};
use chronos_server::routes::create_router;
use chronos_server::services::sync_token::issue_sync_token;
use chronos_server::services::GoogleIdTokenVerifier;
use chronos_server::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Key ID of the fixture RSA key standing in for Google's signing key.
#[allow(dead_code)]
pub const GOOGLE_TEST_KID: &str = "test-google-kid";

#[allow(dead_code)]
const GOOGLE_TEST_PRIVATE_KEY: &str = include_str!("../fixtures/google_test_key.pem");
#[allow(dead_code)]
const GOOGLE_TEST_PUBLIC_KEY: &str = include_str!("../fixtures/google_test_key.pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

#[allow(dead_code)]
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let decoding_key = DecodingKey::from_rsa_pem(GOOGLE_TEST_PUBLIC_KEY.as_bytes())
        .expect("fixture public key should parse");
    let google_verifier = Arc::new(
        GoogleIdTokenVerifier::new_with_static_key(&config, GOOGLE_TEST_KID, decoding_key)
            .expect("static verifier should build"),
    );

    let state = Arc::new(AppState {
        config,
        db: Database::in_memory(),
        google_verifier,
    });

    (create_router(state.clone()), state)
}

/// Insert a user the way first sign-in would.
#[allow(dead_code)]
pub async fn create_user(state: &AppState, email: &str) -> User {
    state
        .db
        .get_or_create_user(NewUser {
            email: email.to_string(),
            name: "Test User".to_string(),
            image: None,
            provider: "google".to_string(),
            provider_id: format!("google-{email}"),
        })
        .await
        .expect("user creation should succeed")
}

/// Session JWT for `email`.
#[allow(dead_code)]
pub fn session_token(state: &AppState, email: &str) -> String {
    create_session_jwt(email, &state.config.jwt_signing_key).expect("session JWT")
}

/// Sync token for `user`.
#[allow(dead_code)]
pub fn sync_token(state: &AppState, user: &User) -> String {
    issue_sync_token(user, &state.config.jwt_signing_key).expect("sync token")
}

/// Sign a Google-style ID token with the fixture key.
#[allow(dead_code)]
pub fn google_id_token(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(GOOGLE_TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(GOOGLE_TEST_PRIVATE_KEY.as_bytes())
        .expect("fixture private key should parse");
    encode(&header, claims, &key).expect("ID token signing")
}

/// Claims of a valid Google ID token for `email` issued to the test client.
#[allow(dead_code)]
pub fn google_claims(config: &Config, email: &str) -> Value {
    let now = now_secs();
    serde_json::json!({
        "iss": "https://accounts.google.com",
        "aud": config.google_client_id,
        "sub": format!("sub-{email}"),
        "iat": now,
        "exp": now + 3600,
        "email": email,
        "email_verified": true,
        "name": "Ada Lovelace",
        "picture": "https://example.com/ada.png"
    })
}

/// POST a JSON body with a bearer token.
#[allow(dead_code)]
pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// GET with a bearer token.
#[allow(dead_code)]
pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
