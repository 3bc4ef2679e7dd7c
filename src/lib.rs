// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Secure Fit e-card backend.
//!
//! This crate provides the backend API for collecting respirator fit-test
//! results, emailing them as HTML e-cards, and keeping owner-scoped records
//! for later review, editing, resending, and deletion.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::FirestoreDb;
use services::{EmailClient, IdentityClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub email: EmailClient,
    pub identity: IdentityClient,
}
