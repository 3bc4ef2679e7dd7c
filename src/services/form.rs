// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Form submission orchestration.
//!
//! The submit pipeline is strictly ordered: validate, dispatch the e-card,
//! persist the record. Each step gates the next; a record is never stored
//! without a successful dispatch, and a store failure after a successful
//! dispatch is a warning rather than an error. The dispatcher and the store
//! are injected through seam traits, never looked up ambiently.

use async_trait::async_trait;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::fit_test::{
    FitTestType, Manufacturer, MaskSize, TestResult, TestingAgent,
};
use crate::models::{FitTestRecord, FormDraft, SessionUser};
use crate::services::card::{render_fit_test_card, CARD_SUBJECT};
use crate::services::email::{CardEmail, EmailClient};
use crate::services::signature::SignaturePad;
use crate::time_utils::{format_date_input, format_utc_rfc3339, today_mmddyyyy};
use crate::validation::{validate_fit_test_form, FieldErrors};

pub const MSG_SUCCESS: &str = "Fit Testing Results E-card sent successfully!";
pub const MSG_STORE_WARNING: &str =
    "E-card sent successfully, but failed to save record to database. Please try again.";
pub const MSG_SEND_ERROR: &str = "Failed to send e-card. Please try again later.";

/// Outbound e-card dispatch seam.
#[async_trait]
pub trait CardDispatcher: Send + Sync {
    async fn send_card(&self, email: &CardEmail) -> Result<(), AppError>;
}

#[async_trait]
impl CardDispatcher for EmailClient {
    async fn send_card(&self, email: &CardEmail) -> Result<(), AppError> {
        EmailClient::send_card(self, email).await
    }
}

/// Record persistence seam.
#[async_trait]
pub trait FitTestStore: Send + Sync {
    async fn create_fit_test(&self, record: &FitTestRecord) -> Result<String, AppError>;
}

#[async_trait]
impl FitTestStore for FirestoreDb {
    async fn create_fit_test(&self, record: &FitTestRecord) -> Result<String, AppError> {
        FirestoreDb::create_fit_test(self, record).await
    }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    /// Stored record ID; `None` when the record was not saved.
    pub record_id: Option<String>,
    /// Present when the card was sent but the record could not be saved.
    pub warning: Option<&'static str>,
}

/// Run the ordered submit pipeline for an already-validated draft.
///
/// `signature_image` is the surface export; its presence stands in for the
/// has-strokes flag during validation. Dispatch failures are returned as
/// errors (nothing is stored); store failures after a successful dispatch
/// produce a receipt with a warning instead.
pub async fn submit_card(
    dispatcher: &dyn CardDispatcher,
    store: &dyn FitTestStore,
    user: &SessionUser,
    draft: FormDraft,
    signature_image: Option<String>,
) -> Result<SubmitReceipt, AppError> {
    let validation = validate_fit_test_form(&draft, signature_image.is_some());
    if !validation.is_valid {
        return Err(AppError::Validation {
            message: validation.error.unwrap_or_default().to_string(),
            field_errors: validation.field_errors,
        });
    }

    let email = CardEmail {
        to_email: draft.recipient_email.trim().to_string(),
        to_name: draft.client_name.clone(),
        subject: CARD_SUBJECT.to_string(),
        html_body: render_fit_test_card(&draft),
    };

    if let Err(err) = dispatcher.send_card(&email).await {
        tracing::error!(error = %err, "Failed to dispatch e-card");
        let message = if err.is_email_recipient_error() {
            AppError::EMAIL_RECIPIENT_EMPTY.to_string()
        } else {
            MSG_SEND_ERROR.to_string()
        };
        return Err(AppError::EmailApi(message));
    }

    let now = format_utc_rfc3339(chrono::Utc::now());
    let record = draft.into_record(&user.uid, signature_image, &now);

    match store.create_fit_test(&record).await {
        Ok(record_id) => {
            tracing::info!(uid = %user.uid, record_id = %record_id, "Fit test record saved");
            Ok(SubmitReceipt {
                record_id: Some(record_id),
                warning: None,
            })
        }
        Err(err) => {
            // The recipient already has the card; report a warning, not an
            // error, and leave retrying to the user.
            tracing::error!(error = %err, uid = %user.uid, "E-card sent but record save failed");
            Ok(SubmitReceipt {
                record_id: None,
                warning: Some(MSG_STORE_WARNING),
            })
        }
    }
}

/// Editable form fields, used to route single-field edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    RecipientEmail,
    ClientName,
    Dob,
    IssueDate,
    FitTestType,
    RespiratorMfg,
    TestingAgent,
    MaskSize,
    Model,
    Result,
    FitTester,
    PrintedName,
}

/// Overall form status shown above the submit button.
#[derive(Debug, Clone, PartialEq)]
pub enum FormStatus {
    Idle,
    Error(String),
    Warning(&'static str),
    Success(&'static str),
}

/// Orchestrates one form session: collects edits, validates, submits, and
/// manages status plus the post-submit reset.
pub struct FormController {
    user: Option<SessionUser>,
    draft: FormDraft,
    field_errors: FieldErrors,
    status: FormStatus,
    submitting: bool,
}

impl FormController {
    /// New controller with a fresh draft: issue date defaults to today and
    /// the fit tester defaults to the signed-in user's name.
    pub fn new(user: Option<SessionUser>) -> Self {
        let fit_tester = user.as_ref().map(|u| u.name.as_str()).unwrap_or("");
        let draft = FormDraft::with_defaults(&today_mmddyyyy(), fit_tester);
        Self {
            user,
            draft,
            field_errors: FieldErrors::default(),
            status: FormStatus::Idle,
            submitting: false,
        }
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Apply a single field edit and clear that field's error.
    ///
    /// Date fields are masked as the user types; select fields parse their
    /// fixed values (unknown manufacturer text becomes the custom escape).
    pub fn set_field(&mut self, field: FormField, value: &str) {
        match field {
            FormField::RecipientEmail => {
                self.draft.recipient_email = value.to_string();
                self.field_errors.recipient_email = None;
            }
            FormField::ClientName => {
                self.draft.client_name = value.to_string();
                self.field_errors.client_name = None;
            }
            FormField::Dob => {
                self.draft.dob = format_date_input(value);
            }
            FormField::IssueDate => {
                self.draft.issue_date = format_date_input(value);
                self.field_errors.issue_date = None;
            }
            FormField::FitTestType => {
                self.draft.fit_test_type = FitTestType::parse(value);
                self.field_errors.fit_test_type = None;
            }
            FormField::RespiratorMfg => {
                self.draft.respirator_mfg = Manufacturer::parse(value);
                self.field_errors.respirator_mfg = None;
            }
            FormField::TestingAgent => {
                self.draft.testing_agent = TestingAgent::parse(value);
                self.field_errors.testing_agent = None;
            }
            FormField::MaskSize => {
                self.draft.mask_size = MaskSize::parse(value);
                self.field_errors.mask_size = None;
            }
            FormField::Model => {
                self.draft.model = value.to_string();
            }
            FormField::Result => {
                self.draft.result = TestResult::parse(value);
                self.field_errors.result = None;
            }
            FormField::FitTester => {
                self.draft.fit_tester = value.to_string();
                self.field_errors.fit_tester = None;
            }
            FormField::PrintedName => {
                self.draft.printed_name = value.to_string();
                self.field_errors.printed_name = None;
            }
        }
    }

    /// Reset to a fresh draft, preserving today's date and the tester name.
    pub fn reset(&mut self) {
        let fit_tester = self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("");
        self.draft = FormDraft::with_defaults(&today_mmddyyyy(), fit_tester);
        self.field_errors = FieldErrors::default();
        self.status = FormStatus::Idle;
    }

    /// Submit the current draft.
    ///
    /// Invalid drafts populate field errors and make no network calls. On
    /// full success the draft is reset and the signature surface silently
    /// emptied; on a store-failure warning both are left untouched so the
    /// user's input survives.
    pub async fn submit(
        &mut self,
        dispatcher: &dyn CardDispatcher,
        store: &dyn FitTestStore,
        signature: &mut SignaturePad,
    ) -> &FormStatus {
        let validation = validate_fit_test_form(&self.draft, signature.has_strokes());
        if !validation.is_valid {
            self.field_errors = validation.field_errors;
            self.status = FormStatus::Error(validation.error.unwrap_or_default().to_string());
            return &self.status;
        }

        self.submitting = true;
        signature.set_disabled(true);

        // Capture the export before dispatch; the buffer is only read here.
        let signature_image = signature.export_png_data_url().ok();

        let email = CardEmail {
            to_email: self.draft.recipient_email.trim().to_string(),
            to_name: self.draft.client_name.clone(),
            subject: CARD_SUBJECT.to_string(),
            html_body: render_fit_test_card(&self.draft),
        };

        if let Err(err) = dispatcher.send_card(&email).await {
            tracing::error!(error = %err, "Failed to dispatch e-card");
            let message = if err.is_email_recipient_error() {
                AppError::EMAIL_RECIPIENT_EMPTY.to_string()
            } else {
                MSG_SEND_ERROR.to_string()
            };
            self.status = FormStatus::Error(message);
            self.finish_submit(signature);
            return &self.status;
        }

        if let Some(user) = &self.user {
            let now = format_utc_rfc3339(chrono::Utc::now());
            let record = self
                .draft
                .clone()
                .into_record(&user.uid, signature_image, &now);

            if let Err(err) = store.create_fit_test(&record).await {
                tracing::error!(error = %err, uid = %user.uid, "E-card sent but record save failed");
                self.status = FormStatus::Warning(MSG_STORE_WARNING);
                self.finish_submit(signature);
                return &self.status;
            }
        } else {
            tracing::warn!("User not signed in, skipping database save");
        }

        self.status = FormStatus::Success(MSG_SUCCESS);
        let fit_tester = self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("");
        self.draft = FormDraft::with_defaults(&today_mmddyyyy(), fit_tester);
        self.field_errors = FieldErrors::default();
        self.finish_submit(signature);
        signature.reset();
        &self.status
    }

    fn finish_submit(&mut self, signature: &mut SignaturePad) {
        self.submitting = false;
        signature.set_disabled(false);
    }
}
