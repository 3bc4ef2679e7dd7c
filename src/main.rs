// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Secure Fit E-card API Server
//!
//! Collects respirator fit-test results, renders them into HTML e-cards,
//! dispatches them by email, and stores owner-scoped records in Firestore.

use securefit_ecard::{
    config::Config,
    db::FirestoreDb,
    services::{EmailClient, IdentityClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Secure Fit E-card API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize the e-card dispatcher
    let email = EmailClient::new(
        config.email_service_id.clone(),
        config.email_template_id.clone(),
        config.email_public_key.clone(),
    );
    tracing::info!(service = %config.email_service_id, "Email dispatcher initialized");

    // Initialize the identity provider client
    let identity = IdentityClient::new(config.firebase_api_key.clone());
    tracing::info!("Identity client initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        email,
        identity,
    });

    // Build router
    let app = securefit_ecard::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("securefit_ecard=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
