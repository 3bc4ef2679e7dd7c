// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! EmailJS API client for dispatching rendered e-cards.
//!
//! Handles:
//! - Card dispatch with template parameters
//! - Empty-recipient precheck (no request is made)
//! - Translation of the provider's "recipients address is empty" failure
//!   (a misconfigured template) into an actionable message

use crate::error::AppError;
use serde_json::json;

/// EmailJS API client.
#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    base_url: String,
    service_id: String,
    template_id: String,
    public_key: String,
}

/// One rendered card ready for dispatch.
#[derive(Debug, Clone)]
pub struct CardEmail {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
}

impl EmailClient {
    /// Create a new EmailJS client with account credentials.
    pub fn new(service_id: String, template_id: String, public_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://api.emailjs.com".to_string(),
            service_id,
            template_id,
            public_key,
        }
    }

    /// Client pointed at a test server instead of the real API.
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Send a rendered e-card.
    ///
    /// Fails before any network call when the recipient is empty.
    pub async fn send_card(&self, email: &CardEmail) -> Result<(), AppError> {
        let recipient = email.to_email.trim();
        if recipient.is_empty() {
            return Err(AppError::BadRequest(
                "Recipient email address is required".to_string(),
            ));
        }

        let to_name = if email.to_name.is_empty() {
            "Recipient"
        } else {
            email.to_name.as_str()
        };

        // The template reads these names; to_email must match the template's
        // "To Email" field ({{to_email}}).
        let body = json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.public_key,
            "template_params": {
                "to_email": recipient,
                "to_name": to_name,
                "subject": email.subject,
                "message": email.html_body,
                "html_message": email.html_body,
                "reply_to": recipient,
            }
        });

        let url = format!("{}/api/v1.0/email/send", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::EmailApi(format!("Send request failed: {}", e)))?;

        self.check_response(response).await
    }

    /// Check response status and classify failures.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // Misconfigured template: the "To Email" field is not bound
        if body.contains("recipients address is empty") {
            tracing::warn!("EmailJS template has no recipient bound");
            return Err(AppError::EmailApi(format!(
                "recipients address is empty (HTTP {})",
                status
            )));
        }

        Err(AppError::EmailApi(format!("HTTP {}: {}", status, body)))
    }
}
