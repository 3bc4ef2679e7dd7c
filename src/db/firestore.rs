// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Fit-test records (owner-scoped CRUD + the resend touch)
//! - Tokens (identity-provider refresh tokens)
//!
//! Listing requires a composite index on (user_id, created_at); the missing-
//! index failure is classified separately so the caller can present the
//! one-time remediation step instead of a generic error.

use crate::db::collections;
use crate::error::AppError;
use crate::models::user::UserTokens;
use crate::models::{FitTestRecord, FitTestUpdate};
use crate::time_utils::format_utc_rfc3339;
use regex::Regex;
use std::sync::LazyLock;

/// Console URL embedded in Firestore's index-required error message.
static INDEX_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://[^\s)]+").expect("index url regex"));

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Fit-Test Operations ─────────────────────────────────────

    /// Store a new fit-test record; the document ID is assigned by Firestore.
    pub async fn create_fit_test(&self, record: &FitTestRecord) -> Result<String, AppError> {
        let created: FitTestRecord = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::FIT_TESTS)
            .generate_document_id()
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        created
            .id
            .ok_or_else(|| AppError::Database("Created document has no ID".to_string()))
    }

    /// List a user's fit-test records, newest created first.
    ///
    /// Requires the composite (user_id, created_at) index; a missing index is
    /// reported as `AppError::IndexRequired` with the console URL when the
    /// provider includes one.
    pub async fn list_fit_tests(&self, user_id: &str) -> Result<Vec<FitTestRecord>, AppError> {
        let uid = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FIT_TESTS)
            .filter(move |q| q.for_all([q.field("user_id").eq(uid.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| classify_query_error(&e.to_string()))
    }

    /// Get a single fit-test record, enforcing owner scoping.
    ///
    /// A foreign or missing ID both read as not-found, so record IDs leak
    /// nothing across users.
    pub async fn get_fit_test_owned(
        &self,
        record_id: &str,
        user_id: &str,
    ) -> Result<FitTestRecord, AppError> {
        let record: Option<FitTestRecord> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::FIT_TESTS)
            .obj()
            .one(record_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match record {
            Some(record) if record.user_id == user_id => Ok(record),
            _ => Err(AppError::NotFound(format!(
                "Fit test record {} not found",
                record_id
            ))),
        }
    }

    /// Apply a partial update to a record and bump `updated_at`.
    ///
    /// An empty update is the resend touch: nothing visible changes but the
    /// record is re-stamped. Returns the stored record.
    pub async fn update_fit_test(
        &self,
        record_id: &str,
        user_id: &str,
        update: &FitTestUpdate,
    ) -> Result<FitTestRecord, AppError> {
        let mut record = self.get_fit_test_owned(record_id, user_id).await?;
        update.apply(&mut record);
        record.updated_at = format_utc_rfc3339(chrono::Utc::now());

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FIT_TESTS)
            .document_id(record_id)
            .object(&record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(record)
    }

    /// Delete a fit-test record. Permanent, no soft-delete.
    ///
    /// Returns the record as it was at deletion (for the confirmation
    /// message).
    pub async fn delete_fit_test(
        &self,
        record_id: &str,
        user_id: &str,
    ) -> Result<FitTestRecord, AppError> {
        // Ownership check before the blind delete
        let record = self.get_fit_test_owned(record_id, user_id).await?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::FIT_TESTS)
            .document_id(record_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(record)
    }

    // ─── Token Operations ────────────────────────────────────────

    /// Get the stored refresh token for a user.
    pub async fn get_tokens(&self, uid: &str) -> Result<Option<UserTokens>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TOKENS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the refresh token for a user.
    pub async fn set_tokens(&self, uid: &str, tokens: &UserTokens) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TOKENS)
            .document_id(uid)
            .object(tokens)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete stored tokens (sign-out).
    pub async fn delete_tokens(&self, uid: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TOKENS)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Classify a listing failure: missing composite index vs. everything else.
///
/// Firestore reports a missing index as FAILED_PRECONDITION with a message
/// like "The query requires an index. You can create it here: https://...".
fn classify_query_error(message: &str) -> AppError {
    let lowered = message.to_lowercase();
    let is_index_error = lowered.contains("failed_precondition")
        || lowered.contains("requires an index")
        || lowered.contains("index");

    if is_index_error {
        let index_url = INDEX_URL_RE
            .find(message)
            .map(|m| m.as_str().to_string());
        tracing::warn!(index_url = ?index_url, "Firestore listing requires a composite index");
        return AppError::IndexRequired { index_url };
    }

    AppError::Database(message.to_string())
}
