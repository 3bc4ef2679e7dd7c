//! Session user and identity-provider token models.

use serde::{Deserialize, Serialize};

/// Signed-in user identity carried by the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    /// Identity provider user ID (also used as document ID)
    pub uid: String,
    pub email: String,
    /// Display name (may be empty if the provider has none)
    #[serde(default)]
    pub name: String,
}

/// Identity-provider refresh token, stored per user.
///
/// Needed to mint fresh ID tokens for profile updates without asking the
/// user to re-enter a password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTokens {
    pub refresh_token: String,
    /// When the token was stored (RFC3339)
    pub stored_at: String,
}
