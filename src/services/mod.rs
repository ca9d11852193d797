// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google_oidc;
pub mod ingest;
pub mod sync_token;

pub use google_oidc::{GoogleIdTokenVerifier, GoogleIdentity, OidcError};
pub use ingest::{ingest_batch, ingest_entry, BatchOutcome};
pub use sync_token::{issue_sync_token, verify_sync_token, CollectorIdentity};
