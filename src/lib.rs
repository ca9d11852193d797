// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Chronos: activity tracking backend
//!
//! This crate provides the API behind the Chronos dashboard and the sync
//! endpoint used by the desktop activity collector.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::GoogleIdTokenVerifier;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub google_verifier: Arc<GoogleIdTokenVerifier>,
}
