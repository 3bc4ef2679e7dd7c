// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes.
//!
//! Email/password sign-up and sign-in plus Google sign-in. The popup flow
//! posts the Google ID token directly; when the popup is blocked, the
//! redirect fallback (`/auth/google/start` -> `/auth/google/callback`)
//! completes the same sign-in server-side with an HMAC-signed state
//! parameter.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::user::UserTokens;
use crate::services::identity::ProviderUser;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a signed OAuth state stays valid.
const OAUTH_STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/google", post(google_sign_in))
        .route("/auth/google/start", get(google_start))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/logout", get(logout))
}

// ─── Password Flows ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignUpRequest {
    email: String,
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
pub struct SignInRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthUserResponse {
    pub uid: String,
    pub email: String,
    pub name: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUserResponse,
}

/// Create an account with email, password, and display name.
async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignUpRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let provider_user = state
        .identity
        .sign_up(&request.email, &request.password, request.name.trim())
        .await?;

    tracing::info!(uid = %provider_user.uid, "Account created");
    establish_session(&state, jar, provider_user).await
}

/// Sign in with email and password.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignInRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let provider_user = state
        .identity
        .sign_in(&request.email, &request.password)
        .await?;

    tracing::info!(uid = %provider_user.uid, "Signed in");
    establish_session(&state, jar, provider_user).await
}

// ─── Google Sign-In ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct GoogleSignInRequest {
    /// Google ID token obtained by the frontend popup flow
    id_token: String,
}

/// Sign in with a Google ID token from the popup flow.
async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<GoogleSignInRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let provider_user = state
        .identity
        .sign_in_with_google(&request.id_token)
        .await?;

    tracing::info!(uid = %provider_user.uid, "Google sign-in (popup flow)");
    establish_session(&state, jar, provider_user).await
}

/// Query parameters for starting the redirect fallback flow.
#[derive(Deserialize)]
pub struct GoogleStartParams {
    /// Frontend URL to redirect back to after OAuth completes.
    /// If not provided, uses FRONTEND_URL.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start the redirect fallback - used when the sign-in popup is blocked.
async fn google_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GoogleStartParams>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    let frontend_url = params
        .redirect_uri
        .unwrap_or_else(|| state.config.frontend_url.clone());

    // Encode frontend URL + timestamp in state
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    // Create the data payload: "frontend_url|timestamp_hex"
    let state_payload = format!("{}|{:x}", frontend_url, timestamp);

    // Sign the payload
    let mut mac = HmacSha256::new_from_slice(&state.config.oauth_state_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    // Combine payload + signature: "payload|signature_hex"
    let signed_state = format!("{}|{}", state_payload, hex::encode(signature));

    // Base64 encode the whole thing for the URL
    let oauth_state = URL_SAFE_NO_PAD.encode(signed_state.as_bytes());

    let callback_url = callback_url_from_headers(&headers);

    let auth_url = format!(
        "https://accounts.google.com/o/oauth2/v2/auth?\
         client_id={}&\
         redirect_uri={}&\
         response_type=code&\
         scope=openid%20email%20profile&\
         state={}",
        state.config.google_client_id,
        urlencoding::encode(&callback_url),
        oauth_state
    );

    tracing::info!(
        frontend_url = %frontend_url,
        "Starting Google redirect fallback, redirecting to consent screen"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange the code, sign in, and hand the session to the
/// frontend.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    // Decode and verify frontend URL from state parameter
    let frontend_url = verify_and_decode_state(&params.state, &state.config.oauth_state_key)
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid or tampered state parameter, falling back to default frontend URL"
            );
            state.config.frontend_url.clone()
        });

    // Check for OAuth errors (user denied, etc.)
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        let redirect = format!("{}?error={}", frontend_url, urlencoding::encode(&error));
        return Ok(Redirect::temporary(&redirect));
    }

    let Some(code) = params.code else {
        let redirect = format!("{}?error=missing_code", frontend_url);
        return Ok(Redirect::temporary(&redirect));
    };

    let callback_url = callback_url_from_headers(&headers);

    let google_id_token = state
        .identity
        .exchange_google_code(
            &code,
            &callback_url,
            &state.config.google_client_id,
            &state.config.google_client_secret,
        )
        .await?;

    let provider_user = state.identity.sign_in_with_google(&google_id_token).await?;

    tracing::info!(uid = %provider_user.uid, "Google sign-in (redirect fallback)");

    store_refresh_token(&state, &provider_user).await;

    // Create JWT session token
    let jwt = create_jwt(
        &provider_user.uid,
        &provider_user.name,
        &provider_user.email,
        &state.config.jwt_signing_key,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    // Redirect to frontend with token
    let redirect_url = format!("{}/callback?token={}", frontend_url, jwt);

    Ok(Redirect::temporary(&redirect_url))
}

/// Sign out: drop the stored refresh token and the session cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(uid) = decode_uid_unverified(cookie.value()) {
            if let Err(e) = state.db.delete_tokens(&uid).await {
                tracing::warn!(error = %e, "Failed to delete stored tokens on logout");
            }
        }
    }

    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    Ok((jar, Json(serde_json::json!({ "success": true }))))
}

// ─── Helpers ─────────────────────────────────────────────────

/// Store the provider refresh token, create the session JWT, and set the
/// session cookie.
async fn establish_session(
    state: &Arc<AppState>,
    jar: CookieJar,
    provider_user: ProviderUser,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    store_refresh_token(state, &provider_user).await;

    let jwt = create_jwt(
        &provider_user.uid,
        &provider_user.name,
        &provider_user.email,
        &state.config.jwt_signing_key,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            token: jwt,
            user: AuthUserResponse {
                uid: provider_user.uid,
                email: provider_user.email,
                name: provider_user.name,
            },
        }),
    ))
}

/// Best-effort persistence of the provider refresh token; profile updates
/// need it later, but a failure must not block sign-in.
async fn store_refresh_token(state: &Arc<AppState>, provider_user: &ProviderUser) {
    let tokens = UserTokens {
        refresh_token: provider_user.refresh_token.clone(),
        stored_at: format_utc_rfc3339(chrono::Utc::now()),
    };
    if let Err(e) = state.db.set_tokens(&provider_user.uid, &tokens).await {
        tracing::warn!(error = %e, uid = %provider_user.uid, "Failed to store refresh token");
    }
}

/// Derive this server's OAuth callback URL from the request headers.
fn callback_url_from_headers(headers: &axum::http::HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            std::env::var("API_HOST").unwrap_or_else(|_| "localhost:8080".to_string())
        });

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}/auth/google/callback", scheme, host)
}

/// Verify the HMAC-signed OAuth state and recover the frontend URL.
///
/// Returns `None` for malformed, tampered, or expired state.
fn verify_and_decode_state(raw_state: &str, key: &[u8]) -> Option<String> {
    let decoded = URL_SAFE_NO_PAD.decode(raw_state).ok()?;
    let decoded_str = std::str::from_utf8(&decoded).ok()?;

    // "frontend_url|timestamp_hex|signature_hex"; the URL itself contains no
    // pipes, so split from the right
    let (payload, signature_hex) = decoded_str.rsplit_once('|')?;
    let (_, timestamp_hex) = payload.rsplit_once('|')?;

    let signature = hex::decode(signature_hex).ok()?;
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).ok()?;

    let timestamp = u128::from_str_radix(timestamp_hex, 16).ok()?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_millis();
    if now.saturating_sub(timestamp) > OAUTH_STATE_MAX_AGE_MS {
        return None;
    }

    let (frontend_url, _) = payload.rsplit_once('|')?;
    Some(frontend_url.to_string())
}

/// Read the uid from a session cookie without validating the signature.
///
/// Only used on logout, where the worst a forged token can do is delete its
/// own stored refresh token.
fn decode_uid_unverified(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    claims["sub"].as_str().map(|s| s.to_string())
}
