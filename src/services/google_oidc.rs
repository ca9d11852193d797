// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google ID token verification for browser sign-in.
//!
//! The dashboard obtains an ID token from Google Identity Services and posts
//! it to `/auth/google`. The token is checked against Google's published
//! signing keys (cached per their `Cache-Control`) and must be issued for our
//! client ID.

use crate::config::Config;
use crate::models::NewUser;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

/// Google's published sign-in keys. The URI is stable; the key set rotates.
const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const CERTS_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_KEYS_TTL: Duration = Duration::from_secs(300);
/// Minimum gap between fetches triggered by unknown key IDs.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);
const CLOCK_SKEW_SECS: u64 = 60;

pub const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl GoogleIdentity {
    /// Profile for creating the user on first sign-in.
    pub fn into_new_user(self) -> NewUser {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.clone());

        NewUser {
            email: self.email,
            name,
            image: self.picture,
            provider: "google".to_string(),
            provider_id: self.subject,
        }
    }
}

/// Why a sign-in credential was not accepted.
#[derive(Debug, Clone)]
pub enum OidcError {
    /// The token is invalid or its claims do not match expectations.
    Rejected(String),
    /// Google's keys could not be fetched.
    Transient(String),
}

/// Signing keys currently trusted, by key ID.
struct KeySet {
    keys: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
    ttl: Duration,
}

impl KeySet {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }

    /// A fresh set is refetched for an unknown key ID at most once per
    /// [`MIN_REFETCH_INTERVAL`].
    fn allows_refetch(&self) -> bool {
        !self.is_fresh() || self.fetched_at.elapsed() >= MIN_REFETCH_INTERVAL
    }
}

enum KeySource {
    /// Fetched from Google and cached per `Cache-Control`.
    Remote {
        http_client: reqwest::Client,
        cached: RwLock<Option<KeySet>>,
        fetch_lock: Mutex<()>,
    },
    /// A single pinned key, for local runs and tests.
    Pinned { kid: String, key: Arc<DecodingKey> },
}

/// Verifier for Google-issued sign-in ID tokens.
pub struct GoogleIdTokenVerifier {
    client_id: String,
    source: KeySource,
}

impl GoogleIdTokenVerifier {
    /// Verifier that trusts Google's published keys.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(CERTS_HTTP_TIMEOUT)
            .build()
            .context("failed building Google certs HTTP client")?;

        let verifier = Self::build(
            config,
            KeySource::Remote {
                http_client,
                cached: RwLock::new(None),
                fetch_lock: Mutex::new(()),
            },
        )?;

        tracing::info!(client_id = %verifier.client_id, "Initialized Google sign-in verifier");
        Ok(verifier)
    }

    /// Verifier that trusts exactly one RSA key under `kid`.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("pinned key ID must not be empty");
        }

        Self::build(
            config,
            KeySource::Pinned {
                kid,
                key: Arc::new(decoding_key),
            },
        )
    }

    fn build(config: &Config, source: KeySource) -> anyhow::Result<Self> {
        if config.google_client_id.trim().is_empty() {
            anyhow::bail!("GOOGLE_CLIENT_ID must not be empty");
        }

        Ok(Self {
            client_id: config.google_client_id.clone(),
            source,
        })
    }

    /// Verify a Google ID token and return the signed-in identity.
    pub async fn verify_id_token(&self, token: &str) -> Result<GoogleIdentity, OidcError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(OidcError::Rejected("ID token is empty".to_string()));
        }

        let header = decode_header(token)
            .map_err(|e| OidcError::Rejected(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(OidcError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| OidcError::Rejected("missing JWT kid".to_string()))?;

        let decoding_key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.validate_nbf = true;
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<GoogleIdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| OidcError::Rejected(format!("JWT validation failed: {e}")))?
            .claims;

        validate_iat(claims.iat)?;

        let email = claims
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| OidcError::Rejected("missing email claim".to_string()))?;

        if claims.email_verified != Some(true) {
            return Err(OidcError::Rejected(
                "email_verified claim is not true".to_string(),
            ));
        }

        tracing::debug!(subject = %claims.sub, "Google ID token verified");

        Ok(GoogleIdentity {
            subject: claims.sub,
            email,
            name: claims.name,
            picture: claims.picture,
        })
    }

    async fn key_for(&self, kid: &str) -> Result<Arc<DecodingKey>, OidcError> {
        let (http_client, cached, fetch_lock) = match &self.source {
            KeySource::Pinned { kid: pinned, key } => {
                return if kid == pinned.as_str() {
                    Ok(key.clone())
                } else {
                    Err(OidcError::Rejected(format!("unknown signing key: {kid}")))
                };
            }
            KeySource::Remote {
                http_client,
                cached,
                fetch_lock,
            } => (http_client, cached, fetch_lock),
        };

        if let Some(key) = fresh_key(cached, kid).await {
            return Ok(key);
        }

        // One fetch per miss; concurrent misses wait for it and re-check.
        let _guard = fetch_lock.lock().await;
        if let Some(key) = fresh_key(cached, kid).await {
            return Ok(key);
        }
        if cached
            .read()
            .await
            .as_ref()
            .is_some_and(|set| !set.allows_refetch())
        {
            return Err(OidcError::Rejected(format!("unknown signing key: {kid}")));
        }

        let key_set = fetch_google_keys(http_client).await?;
        let key = key_set.keys.get(kid).cloned();
        *cached.write().await = Some(key_set);

        key.ok_or_else(|| OidcError::Rejected(format!("unknown signing key: {kid}")))
    }
}

async fn fresh_key(cached: &RwLock<Option<KeySet>>, kid: &str) -> Option<Arc<DecodingKey>> {
    cached
        .read()
        .await
        .as_ref()
        .filter(|set| set.is_fresh())
        .and_then(|set| set.keys.get(kid).cloned())
}

async fn fetch_google_keys(http_client: &reqwest::Client) -> Result<KeySet, OidcError> {
    tracing::debug!(url = GOOGLE_CERTS_URL, "Fetching Google signing keys");

    let response = http_client
        .get(GOOGLE_CERTS_URL)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| OidcError::Transient(format!("certs request failed: {e}")))?;

    let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_KEYS_TTL);

    let jwks: Jwks = response
        .json()
        .await
        .map_err(|e| OidcError::Transient(format!("invalid certs JSON: {e}")))?;

    let keys = usable_rsa_keys(jwks);
    if keys.is_empty() {
        return Err(OidcError::Transient(
            "certs response had no usable RSA keys".to_string(),
        ));
    }

    tracing::debug!(keys = keys.len(), ttl_secs = ttl.as_secs(), "Google signing keys cached");

    Ok(KeySet {
        keys,
        fetched_at: Instant::now(),
        ttl,
    })
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleIdTokenClaims {
    sub: String,
    iat: Option<u64>,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

/// RS256 signing keys from a JWKS document, by key ID.
fn usable_rsa_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
            continue;
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            continue;
        }
        if jwk.use_.as_deref().is_some_and(|u| u != "sig") {
            continue;
        }

        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
            }
        }
    }

    keys_by_kid
}

fn validate_iat(iat: Option<u64>) -> Result<(), OidcError> {
    let Some(iat) = iat else {
        return Err(OidcError::Rejected("missing iat claim".to_string()));
    };

    if iat > now_unix_secs() + CLOCK_SKEW_SECS {
        return Err(OidcError::Rejected("iat claim is in the future".to_string()));
    }

    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value.split(',').find_map(|directive| {
        directive
            .trim()
            .strip_prefix("max-age=")
            .and_then(|raw| raw.trim_matches('"').parse::<u64>().ok())
    })
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
