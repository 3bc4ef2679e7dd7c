//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory; Cloud Run injects
//! them as environment variables via secret bindings.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and OAuth redirects
    pub frontend_url: String,
    /// GCP project ID (Firestore + Identity Toolkit)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// EmailJS service ID
    pub email_service_id: String,
    /// EmailJS template ID
    pub email_template_id: String,
    /// EmailJS public key
    pub email_public_key: String,
    /// Google OAuth client ID (redirect fallback sign-in)
    pub google_client_id: String,

    // --- Secrets (injected as env vars) ---
    /// Identity Toolkit web API key
    pub firebase_api_key: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for OAuth state parameters
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development, secrets can be set via a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            email_service_id: env::var("EMAILJS_SERVICE_ID")
                .map_err(|_| ConfigError::Missing("EMAILJS_SERVICE_ID"))?,
            email_template_id: env::var("EMAILJS_TEMPLATE_ID")
                .map_err(|_| ConfigError::Missing("EMAILJS_TEMPLATE_ID"))?,
            email_public_key: env::var("EMAILJS_PUBLIC_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("EMAILJS_PUBLIC_KEY"))?,
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            email_service_id: "service_test".to_string(),
            email_template_id: "template_test".to_string(),
            email_public_key: "public_test".to_string(),
            google_client_id: "test_google_client".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            google_client_secret: "test_google_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("EMAILJS_SERVICE_ID", "service_u84chaq");
        env::set_var("EMAILJS_TEMPLATE_ID", "template_n6pvpvf");
        env::set_var("EMAILJS_PUBLIC_KEY", "test_public");
        env::set_var("FIREBASE_API_KEY", "test_key");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("OAUTH_STATE_KEY", "test_state_key");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.email_service_id, "service_u84chaq");
        assert_eq!(config.firebase_api_key, "test_key");
        assert_eq!(config.port, 8080);
    }
}
