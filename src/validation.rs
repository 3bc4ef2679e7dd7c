// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pure fit-test form validation.
//!
//! One optional error slot per known field rather than a string-keyed map, so
//! the set of fields that can error is checked at compile time. The headline
//! message is always the first failing field in the fixed check order.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::models::fit_test::FormDraft;

/// Shape check only: something@something.tld
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// Validate email address format.
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Per-field validation errors, in the order the form checks them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_email: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_tester: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_test_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respirator_mfg: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testing_agent: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_size: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printed_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<&'static str>,
}

impl FieldErrors {
    /// Errors in check order; the first entry drives the headline message.
    pub fn in_order(&self) -> [Option<&'static str>; 11] {
        [
            self.recipient_email,
            self.client_name,
            self.fit_tester,
            self.issue_date,
            self.fit_test_type,
            self.respirator_mfg,
            self.testing_agent,
            self.mask_size,
            self.result,
            self.printed_name,
            self.signature,
        ]
    }

    pub fn first(&self) -> Option<&'static str> {
        self.in_order().into_iter().flatten().next()
    }

    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }
}

/// Result of validating a form draft.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub is_valid: bool,
    /// First failing field's message, if any.
    pub error: Option<&'static str>,
    pub field_errors: FieldErrors,
}

pub const ERR_RECIPIENT_EMAIL_MISSING: &str = "Please enter recipient email address.";
pub const ERR_RECIPIENT_EMAIL_INVALID: &str = "Please enter a valid email address.";
pub const ERR_CLIENT_NAME: &str = "Please enter client name.";
pub const ERR_FIT_TESTER: &str = "Please enter fit tester name.";
pub const ERR_ISSUE_DATE: &str = "Please enter issue date.";
pub const ERR_FIT_TEST_TYPE: &str = "Please select fit test type.";
pub const ERR_RESPIRATOR_MFG: &str = "Please select respirator manufacturer.";
pub const ERR_TESTING_AGENT: &str = "Please select testing agent.";
pub const ERR_MASK_SIZE: &str = "Please select mask size.";
pub const ERR_RESULT: &str = "Please select result.";
pub const ERR_PRINTED_NAME: &str = "Please enter printed name.";
pub const ERR_SIGNATURE: &str = "Please provide your signature.";

/// Validate a fit-test form draft.
///
/// `has_strokes` is the signature surface's opaque has-content flag; the
/// validator never inspects pixels. Pure function of its inputs.
pub fn validate_fit_test_form(draft: &FormDraft, has_strokes: bool) -> Validation {
    let mut field_errors = FieldErrors::default();

    let recipient = draft.recipient_email.trim();
    if recipient.is_empty() {
        field_errors.recipient_email = Some(ERR_RECIPIENT_EMAIL_MISSING);
    } else if !validate_email(recipient) {
        field_errors.recipient_email = Some(ERR_RECIPIENT_EMAIL_INVALID);
    }

    if draft.client_name.trim().is_empty() {
        field_errors.client_name = Some(ERR_CLIENT_NAME);
    }

    if draft.fit_tester.trim().is_empty() {
        field_errors.fit_tester = Some(ERR_FIT_TESTER);
    }

    if draft.issue_date.trim().is_empty() {
        field_errors.issue_date = Some(ERR_ISSUE_DATE);
    }

    if draft.fit_test_type.is_none() {
        field_errors.fit_test_type = Some(ERR_FIT_TEST_TYPE);
    }

    if draft
        .respirator_mfg
        .as_ref()
        .map_or(true, |m| m.label().trim().is_empty())
    {
        field_errors.respirator_mfg = Some(ERR_RESPIRATOR_MFG);
    }

    if draft.testing_agent.is_none() {
        field_errors.testing_agent = Some(ERR_TESTING_AGENT);
    }

    if draft.mask_size.is_none() {
        field_errors.mask_size = Some(ERR_MASK_SIZE);
    }

    if draft.result.is_none() {
        field_errors.result = Some(ERR_RESULT);
    }

    if draft.printed_name.trim().is_empty() {
        field_errors.printed_name = Some(ERR_PRINTED_NAME);
    }

    if !has_strokes {
        field_errors.signature = Some(ERR_SIGNATURE);
    }

    let error = field_errors.first();
    Validation {
        is_valid: error.is_none(),
        error,
        field_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fit_test::{
        FitTestType, FormDraft, KnownManufacturer, Manufacturer, MaskSize, TestResult,
        TestingAgent,
    };

    fn complete_draft() -> FormDraft {
        FormDraft {
            recipient_email: "client@example.com".to_string(),
            client_name: "Jordan Reyes".to_string(),
            dob: "01/02/1985".to_string(),
            issue_date: "03/10/2024".to_string(),
            fit_test_type: Some(FitTestType::N95),
            respirator_mfg: Some(Manufacturer::Known(KnownManufacturer::ThreeM)),
            testing_agent: Some(TestingAgent::Bitrex),
            mask_size: Some(MaskSize::Regular),
            model: "1870+".to_string(),
            result: Some(TestResult::Pass),
            fit_tester: "Sam Okafor".to_string(),
            printed_name: "Jordan Reyes".to_string(),
        }
    }

    #[test]
    fn test_complete_draft_with_signature_is_valid() {
        let validation = validate_fit_test_form(&complete_draft(), true);
        assert!(validation.is_valid);
        assert_eq!(validation.error, None);
        assert!(validation.field_errors.is_empty());
    }

    #[test]
    fn test_each_required_field_reports_its_message() {
        let mut draft = complete_draft();
        draft.recipient_email = String::new();
        let v = validate_fit_test_form(&draft, true);
        assert_eq!(
            v.field_errors.recipient_email,
            Some(ERR_RECIPIENT_EMAIL_MISSING)
        );

        let mut draft = complete_draft();
        draft.client_name = "   ".to_string();
        let v = validate_fit_test_form(&draft, true);
        assert_eq!(v.field_errors.client_name, Some(ERR_CLIENT_NAME));
        assert_eq!(v.error, Some(ERR_CLIENT_NAME));

        let mut draft = complete_draft();
        draft.fit_tester = String::new();
        assert_eq!(
            validate_fit_test_form(&draft, true).field_errors.fit_tester,
            Some(ERR_FIT_TESTER)
        );

        let mut draft = complete_draft();
        draft.issue_date = String::new();
        assert_eq!(
            validate_fit_test_form(&draft, true).field_errors.issue_date,
            Some(ERR_ISSUE_DATE)
        );

        let mut draft = complete_draft();
        draft.fit_test_type = None;
        assert_eq!(
            validate_fit_test_form(&draft, true)
                .field_errors
                .fit_test_type,
            Some(ERR_FIT_TEST_TYPE)
        );

        let mut draft = complete_draft();
        draft.respirator_mfg = None;
        assert_eq!(
            validate_fit_test_form(&draft, true)
                .field_errors
                .respirator_mfg,
            Some(ERR_RESPIRATOR_MFG)
        );

        let mut draft = complete_draft();
        draft.testing_agent = None;
        assert_eq!(
            validate_fit_test_form(&draft, true)
                .field_errors
                .testing_agent,
            Some(ERR_TESTING_AGENT)
        );

        let mut draft = complete_draft();
        draft.mask_size = None;
        assert_eq!(
            validate_fit_test_form(&draft, true).field_errors.mask_size,
            Some(ERR_MASK_SIZE)
        );

        let mut draft = complete_draft();
        draft.result = None;
        assert_eq!(
            validate_fit_test_form(&draft, true).field_errors.result,
            Some(ERR_RESULT)
        );

        let mut draft = complete_draft();
        draft.printed_name = String::new();
        assert_eq!(
            validate_fit_test_form(&draft, true)
                .field_errors
                .printed_name,
            Some(ERR_PRINTED_NAME)
        );
    }

    #[test]
    fn test_custom_manufacturer_must_be_nonempty() {
        let mut draft = complete_draft();
        draft.respirator_mfg = Some(Manufacturer::Custom("Gerson".to_string()));
        assert!(validate_fit_test_form(&draft, true).is_valid);

        draft.respirator_mfg = Some(Manufacturer::Custom("  ".to_string()));
        let v = validate_fit_test_form(&draft, true);
        assert_eq!(v.field_errors.respirator_mfg, Some(ERR_RESPIRATOR_MFG));
    }

    #[test]
    fn test_email_shape() {
        for bad in ["plainaddress", "missing@domain", "no@dot@", "a b@c.d", "@x.y"] {
            assert!(!validate_email(bad), "{bad} should be invalid");
        }
        for good in ["x@y.z", "first.last@example.co.uk", "a+b@c.io"] {
            assert!(validate_email(good), "{good} should be valid");
        }

        let mut draft = complete_draft();
        draft.recipient_email = "missing-at.example.com".to_string();
        let v = validate_fit_test_form(&draft, true);
        assert_eq!(
            v.field_errors.recipient_email,
            Some(ERR_RECIPIENT_EMAIL_INVALID)
        );
        assert_eq!(v.error, Some(ERR_RECIPIENT_EMAIL_INVALID));
    }

    #[test]
    fn test_signature_rule_is_independent_of_other_fields() {
        // Everything else valid, no strokes: only the signature errors.
        let v = validate_fit_test_form(&complete_draft(), false);
        assert!(!v.is_valid);
        assert_eq!(v.field_errors.signature, Some(ERR_SIGNATURE));
        assert_eq!(v.error, Some(ERR_SIGNATURE));

        // Everything else invalid too: signature error is still present.
        let v = validate_fit_test_form(&FormDraft::default(), false);
        assert_eq!(v.field_errors.signature, Some(ERR_SIGNATURE));

        // With strokes, no signature error regardless of other fields.
        let v = validate_fit_test_form(&FormDraft::default(), true);
        assert_eq!(v.field_errors.signature, None);
    }

    #[test]
    fn test_headline_is_first_error_in_check_order() {
        let v = validate_fit_test_form(&FormDraft::default(), false);
        assert!(!v.is_valid);
        // Empty draft fails everything; recipient email is checked first.
        assert_eq!(v.error, Some(ERR_RECIPIENT_EMAIL_MISSING));
    }
}
