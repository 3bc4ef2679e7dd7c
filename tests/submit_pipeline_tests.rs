// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end form controller tests over fake dispatcher/store seams.
//!
//! The pipeline contract under test: validate -> dispatch -> persist, each
//! step gated on the last; a record is never stored without a successful
//! dispatch, and a store failure leaves the user's input intact.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use securefit_ecard::error::AppError;
use securefit_ecard::models::{FitTestRecord, SessionUser};
use securefit_ecard::services::email::CardEmail;
use securefit_ecard::services::form::{
    submit_card, CardDispatcher, FitTestStore, FormController, FormField, FormStatus,
    MSG_SEND_ERROR, MSG_STORE_WARNING, MSG_SUCCESS,
};
use securefit_ecard::services::signature::{PointerInput, SignaturePad};
use securefit_ecard::time_utils::today_mmddyyyy;
use securefit_ecard::validation::ERR_SIGNATURE;

// ─── Fakes ───────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum DispatchOutcome {
    Ok,
    Fail,
    FailRecipientEmpty,
}

struct FakeDispatcher {
    outcome: DispatchOutcome,
    calls: Arc<AtomicUsize>,
    last_email: Arc<Mutex<Option<CardEmail>>>,
}

impl FakeDispatcher {
    fn new(outcome: DispatchOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
            last_email: Arc::new(Mutex::new(None)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardDispatcher for FakeDispatcher {
    async fn send_card(&self, email: &CardEmail) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_email.lock().unwrap() = Some(email.clone());
        match self.outcome {
            DispatchOutcome::Ok => Ok(()),
            DispatchOutcome::Fail => Err(AppError::EmailApi("HTTP 500: boom".to_string())),
            DispatchOutcome::FailRecipientEmpty => Err(AppError::EmailApi(
                "recipients address is empty (HTTP 422)".to_string(),
            )),
        }
    }
}

struct FakeStore {
    fail: bool,
    created: Arc<Mutex<Vec<FitTestRecord>>>,
}

impl FakeStore {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn created(&self) -> Vec<FitTestRecord> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl FitTestStore for FakeStore {
    async fn create_fit_test(&self, record: &FitTestRecord) -> Result<String, AppError> {
        if self.fail {
            return Err(AppError::Database("store is down".to_string()));
        }
        self.created.lock().unwrap().push(record.clone());
        Ok(format!("doc-{}", self.created.lock().unwrap().len()))
    }
}

// ─── Helpers ─────────────────────────────────────────────────

fn test_user() -> SessionUser {
    SessionUser {
        uid: "user-1".to_string(),
        email: "tester@example.com".to_string(),
        name: "Sam Okafor".to_string(),
    }
}

fn fill_valid_draft(controller: &mut FormController) {
    controller.set_field(FormField::RecipientEmail, "client@example.com");
    controller.set_field(FormField::ClientName, "Jordan Reyes");
    controller.set_field(FormField::Dob, "01021985");
    controller.set_field(FormField::Model, "1870+");
    controller.set_field(FormField::PrintedName, "Jordan Reyes");
}

fn sign(pad: &mut SignaturePad) {
    pad.pointer_down(PointerInput {
        client_x: 20.0,
        client_y: 20.0,
    });
    pad.pointer_move(PointerInput {
        client_x: 120.0,
        client_y: 60.0,
    });
    pad.pointer_up();
}

// ─── Controller Tests ────────────────────────────────────────

#[tokio::test]
async fn test_happy_path_resets_draft_and_signature() {
    let dispatcher = FakeDispatcher::new(DispatchOutcome::Ok);
    let store = FakeStore::new(false);
    let mut controller = FormController::new(Some(test_user()));
    let mut pad = SignaturePad::new();

    fill_valid_draft(&mut controller);
    sign(&mut pad);

    let status = controller.submit(&dispatcher, &store, &mut pad).await;
    assert_eq!(*status, FormStatus::Success(MSG_SUCCESS));

    // Dispatch happened once with the rendered card
    assert_eq!(dispatcher.calls(), 1);
    let email = dispatcher.last_email.lock().unwrap().clone().unwrap();
    assert_eq!(email.to_email, "client@example.com");
    assert_eq!(email.subject, "Fit Testing Results E-card");
    assert!(email.html_body.contains("Jordan Reyes"));

    // Record stored with the owner, the signature export, and timestamps
    let created = store.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].user_id, "user-1");
    assert_eq!(created[0].created_at, created[0].updated_at);
    assert!(created[0]
        .signature_image
        .as_deref()
        .unwrap()
        .starts_with("data:image/png;base64,"));

    // Draft reset to defaults, preserving today + tester name
    let draft = controller.draft();
    assert_eq!(draft.recipient_email, "");
    assert_eq!(draft.client_name, "");
    assert_eq!(draft.printed_name, "");
    assert_eq!(draft.issue_date, today_mmddyyyy());
    assert_eq!(draft.fit_tester, "Sam Okafor");

    // Signature surface silently emptied and re-enabled
    assert!(!pad.has_strokes());
    assert_eq!(pad.painted_pixel_count(), 0);
    assert!(!pad.is_disabled());
}

#[tokio::test]
async fn test_invalid_draft_makes_no_calls() {
    let dispatcher = FakeDispatcher::new(DispatchOutcome::Ok);
    let store = FakeStore::new(false);
    let mut controller = FormController::new(Some(test_user()));
    let mut pad = SignaturePad::new();

    fill_valid_draft(&mut controller);
    // No signature strokes

    let status = controller.submit(&dispatcher, &store, &mut pad).await;
    assert_eq!(*status, FormStatus::Error(ERR_SIGNATURE.to_string()));
    assert_eq!(controller.field_errors().signature, Some(ERR_SIGNATURE));

    assert_eq!(dispatcher.calls(), 0);
    assert!(store.created().is_empty());

    // The entered data is still there
    assert_eq!(controller.draft().client_name, "Jordan Reyes");
}

#[tokio::test]
async fn test_email_failure_stores_nothing_and_keeps_draft() {
    let dispatcher = FakeDispatcher::new(DispatchOutcome::Fail);
    let store = FakeStore::new(false);
    let mut controller = FormController::new(Some(test_user()));
    let mut pad = SignaturePad::new();

    fill_valid_draft(&mut controller);
    sign(&mut pad);

    let status = controller.submit(&dispatcher, &store, &mut pad).await;
    assert_eq!(*status, FormStatus::Error(MSG_SEND_ERROR.to_string()));

    // Hard precondition: no record without a successful dispatch
    assert!(store.created().is_empty());
    assert_eq!(controller.draft().client_name, "Jordan Reyes");
    assert!(pad.has_strokes());
}

#[tokio::test]
async fn test_recipient_empty_provider_error_is_actionable() {
    let dispatcher = FakeDispatcher::new(DispatchOutcome::FailRecipientEmpty);
    let store = FakeStore::new(false);
    let mut controller = FormController::new(Some(test_user()));
    let mut pad = SignaturePad::new();

    fill_valid_draft(&mut controller);
    sign(&mut pad);

    let status = controller.submit(&dispatcher, &store, &mut pad).await;
    assert_eq!(
        *status,
        FormStatus::Error(AppError::EMAIL_RECIPIENT_EMPTY.to_string())
    );
    assert!(store.created().is_empty());
}

#[tokio::test]
async fn test_store_failure_warns_and_preserves_input() {
    let dispatcher = FakeDispatcher::new(DispatchOutcome::Ok);
    let store = FakeStore::new(true);
    let mut controller = FormController::new(Some(test_user()));
    let mut pad = SignaturePad::new();

    fill_valid_draft(&mut controller);
    sign(&mut pad);

    let status = controller.submit(&dispatcher, &store, &mut pad).await;
    assert_eq!(*status, FormStatus::Warning(MSG_STORE_WARNING));

    // The card went out exactly once, nothing was stored, and the user's
    // input (draft + signature) survives for a retry
    assert_eq!(dispatcher.calls(), 1);
    assert!(store.created().is_empty());
    assert_eq!(controller.draft().client_name, "Jordan Reyes");
    assert!(pad.has_strokes());
    assert!(pad.painted_pixel_count() > 0);
}

#[tokio::test]
async fn test_signed_out_user_sends_without_storing() {
    let dispatcher = FakeDispatcher::new(DispatchOutcome::Ok);
    let store = FakeStore::new(false);
    let mut controller = FormController::new(None);
    let mut pad = SignaturePad::new();

    fill_valid_draft(&mut controller);
    controller.set_field(FormField::FitTester, "Walk-in Tester");
    sign(&mut pad);

    let status = controller.submit(&dispatcher, &store, &mut pad).await;
    assert_eq!(*status, FormStatus::Success(MSG_SUCCESS));
    assert_eq!(dispatcher.calls(), 1);
    assert!(store.created().is_empty());
}

// ─── Pipeline Function Tests ─────────────────────────────────

#[tokio::test]
async fn test_submit_card_validation_error_carries_field_errors() {
    let dispatcher = FakeDispatcher::new(DispatchOutcome::Ok);
    let store = FakeStore::new(false);

    let draft = securefit_ecard::models::FormDraft::default();
    let err = submit_card(&dispatcher, &store, &test_user(), draft, None)
        .await
        .unwrap_err();

    match err {
        AppError::Validation {
            message,
            field_errors,
        } => {
            assert_eq!(message, "Please enter recipient email address.");
            assert!(field_errors.signature.is_some());
        }
        other => panic!("expected Validation, got {:?}", other),
    }
    assert_eq!(dispatcher.calls(), 0);
}

#[tokio::test]
async fn test_submit_card_store_failure_is_warning_receipt() {
    let dispatcher = FakeDispatcher::new(DispatchOutcome::Ok);
    let store = FakeStore::new(true);

    let mut draft = securefit_ecard::models::FormDraft::with_defaults("03/10/2024", "Sam Okafor");
    draft.recipient_email = "client@example.com".to_string();
    draft.client_name = "Jordan Reyes".to_string();
    draft.printed_name = "Jordan Reyes".to_string();

    let receipt = submit_card(
        &dispatcher,
        &store,
        &test_user(),
        draft,
        Some("data:image/png;base64,AAAA".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(receipt.record_id, None);
    assert_eq!(receipt.warning, Some(MSG_STORE_WARNING));
    assert_eq!(dispatcher.calls(), 1);
}

#[tokio::test]
async fn test_submit_card_success_receipt() {
    let dispatcher = FakeDispatcher::new(DispatchOutcome::Ok);
    let store = FakeStore::new(false);

    let mut draft = securefit_ecard::models::FormDraft::with_defaults("03/10/2024", "Sam Okafor");
    draft.recipient_email = "client@example.com".to_string();
    draft.client_name = "Jordan Reyes".to_string();
    draft.printed_name = "Jordan Reyes".to_string();

    let receipt = submit_card(
        &dispatcher,
        &store,
        &test_user(),
        draft,
        Some("data:image/png;base64,AAAA".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(receipt.record_id.as_deref(), Some("doc-1"));
    assert_eq!(receipt.warning, None);
    assert_eq!(store.created()[0].signature_image.as_deref(), Some("data:image/png;base64,AAAA"));
}
