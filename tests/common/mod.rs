// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use securefit_ecard::config::Config;
use securefit_ecard::db::FirestoreDb;
use securefit_ecard::routes::create_router;
use securefit_ecard::services::{EmailClient, IdentityClient};
use securefit_ecard::AppState;
use std::sync::Arc;

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

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
///
/// External clients point at an unroutable address, so any test that
/// accidentally reaches the network fails fast instead of calling out.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let email = EmailClient::new(
        config.email_service_id.clone(),
        config.email_template_id.clone(),
        config.email_public_key.clone(),
    )
    .with_base_url("http://127.0.0.1:1".to_string());

    let identity = IdentityClient::new(config.firebase_api_key.clone())
        .with_base_url("http://127.0.0.1:1".to_string());

    let state = Arc::new(AppState {
        config,
        db,
        email,
        identity,
    });

    (create_router(state.clone()), state)
}

/// Create a signed session JWT for tests.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    securefit_ecard::middleware::auth::create_jwt(uid, "Test User", "tester@example.com", signing_key)
        .expect("JWT creation should succeed")
}
