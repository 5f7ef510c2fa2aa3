//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup and cached in the `Config` struct;
//! handlers never touch the environment directly.

use std::env;

/// Token lifetimes, matching the original deployment defaults.
pub const ACCESS_TOKEN_TTL_SECS: u64 = 24 * 60 * 60; // 1 day
pub const REFRESH_TOKEN_TTL_SECS: u64 = 10 * 24 * 60 * 60; // 10 days

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Allowed CORS origin (the web client)
    pub cors_origin: String,
    /// GCP project ID for Firestore (or emulator project for local dev)
    pub gcp_project_id: String,
    /// Signing key for short-lived access tokens
    pub access_token_key: Vec<u8>,
    /// Signing key for refresh tokens; never the same as the access key
    pub refresh_token_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            access_token_key: env::var("ACCESS_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?
                .into_bytes(),
            refresh_token_key: env::var("REFRESH_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?
                .into_bytes(),
        })
    }

    /// Fixed config for tests; never reads the environment.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            cors_origin: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            access_token_key: b"test_access_key_32_bytes_minimum".to_vec(),
            refresh_token_key: b"test_refresh_key_32_bytes_minimm".to_vec(),
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
        env::set_var("ACCESS_TOKEN_SECRET", "test_access_key_32_bytes_minimum");
        env::set_var("REFRESH_TOKEN_SECRET", "test_refresh_key_32_bytes_minimm");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert!(!config.access_token_key.is_empty());
        assert_ne!(config.access_token_key, config.refresh_token_key);
    }
}
