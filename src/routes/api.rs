// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::fit_test::{
    FitTestType, Manufacturer, MaskSize, TestResult, TestingAgent,
};
use crate::models::{FitTestRecord, FitTestUpdate, FormDraft, SessionUser};
use crate::services::card::{render_fit_test_card, CARD_SUBJECT};
use crate::services::email::CardEmail;
use crate::services::form::{submit_card, MSG_SUCCESS};
use crate::services::grouping::{group_by_month, MonthBucket};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/account", put(update_account))
        .route("/api/account/password", put(change_password))
        .route("/api/fit-tests", post(submit_fit_test).get(list_fit_tests))
        .route(
            "/api/fit-tests/{id}",
            get(get_fit_test)
                .put(update_fit_test)
                .delete(delete_fit_test),
        )
        .route("/api/fit-tests/{id}/resend", post(resend_fit_test))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub uid: String,
    pub email: String,
    pub name: String,
}

/// Get current user profile (from the session claims).
async fn get_me(Extension(user): Extension<AuthUser>) -> Result<Json<UserResponse>> {
    Ok(Json(UserResponse {
        uid: user.uid,
        email: user.email,
        name: user.name,
    }))
}

// ─── Account Management ──────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(max = 200))]
    name: Option<String>,
    #[validate(email)]
    email: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateAccountResponse {
    pub success: bool,
    pub name: String,
    pub email: String,
}

/// Update display name and/or email with the identity provider.
///
/// Needs a fresh provider ID token, minted from the refresh token stored at
/// sign-in; a missing token means the user must sign in again.
async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<UpdateAccountResponse>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let tokens = state.db.get_tokens(&user.uid).await?.ok_or_else(|| {
        AppError::AuthProvider(
            crate::services::identity::map_auth_error("TOKEN_EXPIRED").to_string(),
        )
    })?;

    let id_token = state.identity.refresh_id_token(&tokens.refresh_token).await?;

    state
        .identity
        .update_profile(&id_token, request.name.as_deref(), request.email.as_deref())
        .await?;

    tracing::info!(uid = %user.uid, "Profile updated");

    Ok(Json(UpdateAccountResponse {
        success: true,
        name: request.name.unwrap_or(user.name),
        email: request.email.unwrap_or(user.email),
    }))
}

#[derive(Deserialize, Validate)]
pub struct ChangePasswordRequest {
    current_password: String,
    #[validate(length(min = 6, max = 200))]
    new_password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SimpleResponse {
    pub success: bool,
    pub message: String,
}

/// Change password; the current password is re-verified first.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<SimpleResponse>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .identity
        .change_password(&user.email, &request.current_password, &request.new_password)
        .await?;

    tracing::info!(uid = %user.uid, "Password changed");

    Ok(Json(SimpleResponse {
        success: true,
        message: "Password updated successfully.".to_string(),
    }))
}

// ─── Fit-Test Submission ─────────────────────────────────────

/// Submit payload: the form draft plus the signature export.
///
/// Select values arrive as plain strings and are parsed against the fixed
/// vocabularies; anything unrecognized reads as "not selected" and fails
/// form validation with that field's message, same as the form itself.
#[derive(Deserialize, Validate)]
pub struct SubmitFitTestRequest {
    #[validate(length(max = 320))]
    #[serde(default)]
    recipient_email: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    client_name: String,
    #[validate(length(max = 10))]
    #[serde(default)]
    dob: String,
    #[validate(length(max = 10))]
    #[serde(default)]
    issue_date: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    fit_test_type: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    respirator_mfg: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    testing_agent: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    mask_size: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    model: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    result: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    fit_tester: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    printed_name: String,
    /// Signature surface export (PNG data URL); presence is the
    /// has-strokes signal
    #[validate(length(max = 500000))]
    #[serde(default)]
    signature: Option<String>,
}

impl SubmitFitTestRequest {
    fn to_draft(&self) -> FormDraft {
        FormDraft {
            recipient_email: self.recipient_email.clone(),
            client_name: self.client_name.clone(),
            dob: self.dob.clone(),
            issue_date: self.issue_date.clone(),
            fit_test_type: FitTestType::parse(&self.fit_test_type),
            respirator_mfg: Manufacturer::parse(&self.respirator_mfg),
            testing_agent: TestingAgent::parse(&self.testing_agent),
            mask_size: MaskSize::parse(&self.mask_size),
            model: self.model.clone(),
            result: TestResult::parse(&self.result),
            fit_tester: self.fit_tester.clone(),
            printed_name: self.printed_name.clone(),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubmitFitTestResponse {
    /// "success" or "warning" (card sent, record not saved)
    pub status: String,
    pub message: String,
    pub record_id: Option<String>,
}

/// Submit a fit-test form: validate, dispatch the e-card, store the record.
async fn submit_fit_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SubmitFitTestRequest>,
) -> Result<Json<SubmitFitTestResponse>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let draft = request.to_draft();
    let signature_image = request
        .signature
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let session_user = SessionUser {
        uid: user.uid.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
    };

    let receipt = submit_card(
        &state.email,
        &state.db,
        &session_user,
        draft,
        signature_image,
    )
    .await?;

    let response = match receipt.warning {
        Some(warning) => SubmitFitTestResponse {
            status: "warning".to_string(),
            message: warning.to_string(),
            record_id: None,
        },
        None => SubmitFitTestResponse {
            status: "success".to_string(),
            message: MSG_SUCCESS.to_string(),
            record_id: receipt.record_id,
        },
    };

    Ok(Json(response))
}

// ─── Results Listing ─────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FitTestListResponse {
    /// Month buckets, newest month first; dateless records join no bucket
    pub months: Vec<MonthBucket>,
    pub total: u32,
}

/// List the user's fit-test records grouped by issue-date month.
///
/// A missing composite index surfaces as `index_required` with the console
/// URL so the UI can present the one-time remediation plus a retry.
async fn list_fit_tests(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FitTestListResponse>> {
    let records = state.db.list_fit_tests(&user.uid).await?;

    tracing::debug!(uid = %user.uid, count = records.len(), "Fetched fit test records");

    let total = records.len() as u32;
    let months = group_by_month(&records);

    Ok(Json(FitTestListResponse { months, total }))
}

/// Get one record (edit-form prefill).
async fn get_fit_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(record_id): Path<String>,
) -> Result<Json<FitTestRecord>> {
    let record = state.db.get_fit_test_owned(&record_id, &user.uid).await?;
    Ok(Json(record))
}

// ─── Record Editing ──────────────────────────────────────────

/// Partial edit; absent fields are unchanged. Select values are parsed
/// against the fixed vocabularies and rejected when unrecognized.
#[derive(Deserialize, Validate)]
pub struct UpdateFitTestRequest {
    #[validate(length(max = 320))]
    recipient_email: Option<String>,
    #[validate(length(max = 200))]
    client_name: Option<String>,
    #[validate(length(max = 10))]
    dob: Option<String>,
    #[validate(length(max = 10))]
    issue_date: Option<String>,
    #[validate(length(max = 50))]
    fit_test_type: Option<String>,
    #[validate(length(max = 100))]
    respirator_mfg: Option<String>,
    #[validate(length(max = 50))]
    testing_agent: Option<String>,
    #[validate(length(max = 50))]
    mask_size: Option<String>,
    #[validate(length(max = 100))]
    model: Option<String>,
    #[validate(length(max = 50))]
    result: Option<String>,
    #[validate(length(max = 200))]
    fit_tester: Option<String>,
    #[validate(length(max = 200))]
    printed_name: Option<String>,
}

impl UpdateFitTestRequest {
    fn to_update(&self) -> Result<FitTestUpdate> {
        let mut update = FitTestUpdate {
            recipient_email: self.recipient_email.clone(),
            client_name: self.client_name.clone(),
            dob: self.dob.clone(),
            issue_date: self.issue_date.clone(),
            model: self.model.clone(),
            fit_tester: self.fit_tester.clone(),
            printed_name: self.printed_name.clone(),
            ..Default::default()
        };

        if let Some(value) = self.fit_test_type.as_deref() {
            update.fit_test_type = Some(
                FitTestType::parse(value)
                    .ok_or_else(|| bad_select("fit test type", value))?,
            );
        }
        if let Some(value) = self.respirator_mfg.as_deref() {
            update.respirator_mfg = Some(
                Manufacturer::parse(value)
                    .ok_or_else(|| bad_select("respirator manufacturer", value))?,
            );
        }
        if let Some(value) = self.testing_agent.as_deref() {
            update.testing_agent = Some(
                TestingAgent::parse(value)
                    .ok_or_else(|| bad_select("testing agent", value))?,
            );
        }
        if let Some(value) = self.mask_size.as_deref() {
            update.mask_size =
                Some(MaskSize::parse(value).ok_or_else(|| bad_select("mask size", value))?);
        }
        if let Some(value) = self.result.as_deref() {
            update.result =
                Some(TestResult::parse(value).ok_or_else(|| bad_select("result", value))?);
        }

        Ok(update)
    }
}

fn bad_select(field: &str, value: &str) -> AppError {
    AppError::BadRequest(format!("Invalid {}: {:?}", field, value))
}

/// Edit a stored record. Always bumps updated_at.
async fn update_fit_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(record_id): Path<String>,
    Json(request): Json<UpdateFitTestRequest>,
) -> Result<Json<FitTestRecord>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let update = request.to_update()?;
    let record = state
        .db
        .update_fit_test(&record_id, &user.uid, &update)
        .await?;

    tracing::info!(uid = %user.uid, record_id = %record_id, "Fit test record updated");

    Ok(Json(record))
}

// ─── Resend ──────────────────────────────────────────────────

/// Resend the e-card from the stored record, then re-stamp updated_at.
///
/// Independent of editing: the card renders from the record as currently
/// saved, and the follow-up update changes no visible field.
async fn resend_fit_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(record_id): Path<String>,
) -> Result<Json<SimpleResponse>> {
    let record = state.db.get_fit_test_owned(&record_id, &user.uid).await?;

    let recipient = record.recipient_email.trim().to_string();
    if recipient.is_empty() {
        return Err(AppError::BadRequest(
            "Cannot resend: No recipient email found for this record.".to_string(),
        ));
    }

    let email = CardEmail {
        to_email: recipient.clone(),
        to_name: record.client_name.clone(),
        subject: CARD_SUBJECT.to_string(),
        html_body: render_fit_test_card(&record.to_draft()),
    };

    state.email.send_card(&email).await.map_err(|err| {
        tracing::error!(error = %err, record_id = %record_id, "Failed to resend e-card");
        if err.is_email_recipient_error() {
            AppError::EmailApi(AppError::EMAIL_RECIPIENT_EMPTY.to_string())
        } else {
            err
        }
    })?;

    // The touch only re-stamps updated_at; the card already went out, so a
    // failure here is logged and not surfaced.
    if let Err(err) = state
        .db
        .update_fit_test(&record_id, &user.uid, &FitTestUpdate::default())
        .await
    {
        tracing::warn!(error = %err, record_id = %record_id, "Resend timestamp update failed");
    }

    Ok(Json(SimpleResponse {
        success: true,
        message: format!("E-card resent successfully to {}!", recipient),
    }))
}

// ─── Delete ──────────────────────────────────────────────────

/// Delete a record after explicit user confirmation. Permanent.
async fn delete_fit_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(record_id): Path<String>,
) -> Result<Json<SimpleResponse>> {
    let record = state.db.delete_fit_test(&record_id, &user.uid).await?;

    tracing::info!(uid = %user.uid, record_id = %record_id, "Fit test record deleted");

    let client_name = if record.client_name.is_empty() {
        "this record".to_string()
    } else {
        record.client_name
    };

    Ok(Json(SimpleResponse {
        success: true,
        message: format!(
            "Fit test record for \"{}\" has been deleted successfully.",
            client_name
        ),
    }))
}
