// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity Toolkit API client for account management.
//!
//! Handles:
//! - Email/password sign-up and sign-in
//! - Google sign-in (ID token from the popup flow, or a code exchanged by
//!   the redirect fallback when the popup is blocked)
//! - Profile and password updates (password changes re-verify the current
//!   password first)
//! - Mapping the provider's error codes to a fixed set of user-facing
//!   messages; unknown codes fall back to a generic message

use crate::error::AppError;
use serde::Deserialize;
use serde_json::json;

/// Fallback for provider codes outside the fixed vocabulary.
pub const GENERIC_AUTH_ERROR: &str = "An error occurred. Please try again.";

/// Identity Toolkit API client.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    oauth_url: String,
    api_key: String,
}

/// Provider-verified account, returned by every sign-in/sign-up path.
#[derive(Debug, Clone)]
pub struct ProviderUser {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub id_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize)]
struct AccountResponse {
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(rename = "displayName", default)]
    display_name: String,
    #[serde(rename = "idToken")]
    id_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(rename = "id_token")]
    id_token: String,
}

#[derive(Deserialize)]
struct CodeExchangeResponse {
    #[serde(rename = "id_token")]
    id_token: String,
}

impl IdentityClient {
    /// Create a new client with the project's web API key.
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            token_url: "https://securetoken.googleapis.com/v1".to_string(),
            oauth_url: "https://oauth2.googleapis.com".to_string(),
            api_key,
        }
    }

    /// Client pointed at a test server instead of the real API.
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.token_url = base_url.clone();
        self.oauth_url = base_url.clone();
        self.base_url = base_url;
        self
    }

    /// Create an account and set its display name.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<ProviderUser, AppError> {
        let account: AccountResponse = self
            .post_json(
                "accounts:signUp",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let mut user = ProviderUser {
            uid: account.local_id,
            email: account.email,
            name: account.display_name,
            id_token: account.id_token,
            refresh_token: account.refresh_token,
        };

        if !name.is_empty() {
            self.update_profile(&user.id_token, Some(name), None).await?;
            user.name = name.to_string();
        }

        Ok(user)
    }

    /// Verify an email/password pair.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, AppError> {
        let account: AccountResponse = self
            .post_json(
                "accounts:signInWithPassword",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        Ok(ProviderUser {
            uid: account.local_id,
            email: account.email,
            name: account.display_name,
            id_token: account.id_token,
            refresh_token: account.refresh_token,
        })
    }

    /// Sign in with a Google ID token (from the popup flow or the redirect
    /// fallback's code exchange).
    pub async fn sign_in_with_google(&self, google_id_token: &str) -> Result<ProviderUser, AppError> {
        let account: AccountResponse = self
            .post_json(
                "accounts:signInWithIdp",
                json!({
                    "postBody": format!("id_token={}&providerId=google.com", google_id_token),
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;

        Ok(ProviderUser {
            uid: account.local_id,
            email: account.email,
            name: account.display_name,
            id_token: account.id_token,
            refresh_token: account.refresh_token,
        })
    }

    /// Exchange an OAuth authorization code for a Google ID token.
    ///
    /// Used by the redirect fallback when the interactive popup is blocked.
    pub async fn exchange_google_code(
        &self,
        code: &str,
        redirect_uri: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(format!("Code exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Google code exchange rejected");
            tracing::debug!(body = %body, "Code exchange error body");
            return Err(AppError::AuthProvider(GENERIC_AUTH_ERROR.to_string()));
        }

        let exchanged: CodeExchangeResponse = response
            .json()
            .await
            .map_err(|e| AppError::AuthProvider(format!("Code exchange parse error: {}", e)))?;
        Ok(exchanged.id_token)
    }

    /// Mint a fresh ID token from a stored refresh token.
    pub async fn refresh_id_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let url = format!("{}/token?key={}", self.token_url, self.api_key);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(format!("Token refresh failed: {}", e)))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            let code = extract_error_code(&body);
            return Err(AppError::AuthProvider(map_auth_error(&code).to_string()));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AppError::AuthProvider(format!("Token refresh parse error: {}", e)))?;
        Ok(refreshed.id_token)
    }

    /// Update display name and/or email.
    pub async fn update_profile(
        &self,
        id_token: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), AppError> {
        let mut body = json!({
            "idToken": id_token,
            "returnSecureToken": false,
        });
        if let Some(name) = name {
            body["displayName"] = json!(name);
        }
        if let Some(email) = email {
            body["email"] = json!(email);
        }

        let _: serde_json::Value = self.post_json("accounts:update", body).await?;
        Ok(())
    }

    /// Change the password, re-verifying the current one first.
    pub async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        // Re-authentication gates the change; its failure surfaces as the
        // wrong-password message.
        let verified = self.sign_in(email, current_password).await?;

        let _: serde_json::Value = self
            .post_json(
                "accounts:update",
                json!({
                    "idToken": verified.id_token,
                    "password": new_password,
                    "returnSecureToken": false,
                }),
            )
            .await?;
        Ok(())
    }

    /// POST to an Identity Toolkit endpoint, mapping error envelopes to
    /// user-facing messages.
    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T, AppError> {
        let url = format!("{}/{}?key={}", self.base_url, endpoint, self.api_key);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(format!("Identity request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let code = extract_error_code(&body);
            tracing::warn!(endpoint, status = %status, code = %code, "Identity provider rejected request");
            return Err(AppError::AuthProvider(map_auth_error(&code).to_string()));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::AuthProvider(format!("Identity response parse error: {}", e)))
    }
}

/// Pull the provider's error code out of its JSON envelope.
///
/// The message field sometimes carries a suffix ("WEAK_PASSWORD : Password
/// should be at least 6 characters"); only the leading code matters.
fn extract_error_code(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v["error"]["message"].as_str())
        .map(|message| {
            message
                .split([' ', ':'])
                .next()
                .unwrap_or(message)
                .to_string()
        })
        .unwrap_or_default()
}

/// Convert provider error codes to user-friendly messages.
pub fn map_auth_error(code: &str) -> &'static str {
    match code {
        "EMAIL_EXISTS" => {
            "This email is already registered. Please use a different email or try logging in."
        }
        "INVALID_EMAIL" => "Please enter a valid email address.",
        "OPERATION_NOT_ALLOWED" => {
            "Email/password accounts are not enabled. Please contact support."
        }
        "WEAK_PASSWORD" => "Password is too weak. Please use at least 6 characters.",
        "USER_DISABLED" => "This account has been disabled. Please contact support.",
        "EMAIL_NOT_FOUND" => "No account found with this email. Please sign up first.",
        "INVALID_PASSWORD" => "Incorrect password. Please try again.",
        "INVALID_LOGIN_CREDENTIALS" => "Invalid email or password. Please try again.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many failed attempts. Please try again later.",
        "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
            "Please log out and log back in to change your email or password."
        }
        "UNAUTHORIZED_DOMAIN" => "Sign-in from this domain is not allowed. Please contact support.",
        _ => GENERIC_AUTH_ERROR,
    }
}
