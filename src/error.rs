// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::validation::FieldErrors;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Form validation failed: {message}")]
    Validation {
        message: String,
        field_errors: FieldErrors,
    },

    #[error("Email dispatch error: {0}")]
    EmailApi(String),

    #[error("{0}")]
    AuthProvider(String),

    #[error("Query requires a Firestore index")]
    IndexRequired { index_url: Option<String> },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Actionable message for the EmailJS empty-recipient template misconfiguration.
    pub const EMAIL_RECIPIENT_EMPTY: &'static str =
        "Recipient email is missing. Check that the email template \"To Email\" field is set to {{to_email}}";

    /// Whether a dispatch error is the provider's empty-recipient condition.
    pub fn is_email_recipient_error(&self) -> bool {
        match self {
            AppError::EmailApi(msg) => msg.contains("recipients address is empty"),
            _ => false,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_url: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details, field_errors, index_url) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None, None, None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None, None, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg), None, None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg), None, None)
            }
            AppError::Validation {
                message,
                field_errors,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                Some(message),
                Some(field_errors),
                None,
            ),
            AppError::EmailApi(msg) => {
                (StatusCode::BAD_GATEWAY, "email_error", Some(msg), None, None)
            }
            AppError::AuthProvider(msg) => {
                (StatusCode::BAD_REQUEST, "auth_error", Some(msg), None, None)
            }
            AppError::IndexRequired { index_url } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "index_required",
                Some(
                    "A one-time Firestore composite index on (user_id, created_at) must be \
                     created before records can be listed. Create it in the console, wait for \
                     it to build, then retry."
                        .to_string(),
                ),
                None,
                index_url,
            ),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    None,
                    None,
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    None,
                    None,
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            field_errors,
            index_url,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
