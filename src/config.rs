// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Loaded and validated once at startup. Bad OAuth client settings abort
//! process initialization instead of failing per request.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Spotify OAuth client ID (public)
    pub spotify_client_id: String,
    /// Spotify OAuth client secret
    pub spotify_client_secret: String,
    /// Registered OAuth callback URL (points at `/user/auth/callback`)
    pub spotify_redirect_url: String,
    /// Spotify accounts service base URL (authorize + token endpoints)
    pub spotify_accounts_url: String,
    /// Spotify Web API base URL
    pub spotify_api_url: String,
    /// NetEase Cloud Music base URL
    pub netease_api_url: String,
    /// Frontend URL for OAuth landing redirects
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,
    /// Deadline for a single transfer request
    pub transfer_timeout: Duration,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            spotify_client_id: "test_client_id".to_string(),
            spotify_client_secret: "test_secret".to_string(),
            spotify_redirect_url: "http://localhost:8081/user/auth/callback".to_string(),
            spotify_accounts_url: "http://127.0.0.1:9".to_string(),
            spotify_api_url: "http://127.0.0.1:9/v1".to_string(),
            netease_api_url: "http://127.0.0.1:9".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8081,
            http_timeout: Duration::from_secs(5),
            transfer_timeout: Duration::from_secs(30),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Self {
            spotify_client_id: env::var("SPOTIFY_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SPOTIFY_CLIENT_ID"))?,
            spotify_client_secret: env::var("SPOTIFY_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SPOTIFY_CLIENT_SECRET"))?,
            spotify_redirect_url: env::var("SPOTIFY_REDIRECT_URL")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SPOTIFY_REDIRECT_URL"))?,
            spotify_accounts_url: env::var("SPOTIFY_ACCOUNTS_URL")
                .unwrap_or_else(|_| "https://accounts.spotify.com".to_string()),
            spotify_api_url: env::var("SPOTIFY_API_URL")
                .unwrap_or_else(|_| "https://api.spotify.com/v1".to_string()),
            netease_api_url: env::var("NETEASE_API_URL")
                .unwrap_or_else(|_| "https://music.163.com".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8081".to_string())
                .parse()
                .unwrap_or(8081),
            http_timeout: Duration::from_secs(parse_secs("HTTP_TIMEOUT_SECS", 15)),
            transfer_timeout: Duration::from_secs(parse_secs("TRANSFER_TIMEOUT_SECS", 300)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot possibly complete an OAuth flow.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spotify_client_id.is_empty() {
            return Err(ConfigError::Invalid("SPOTIFY_CLIENT_ID", "must not be blank"));
        }
        if self.spotify_client_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "SPOTIFY_CLIENT_SECRET",
                "must not be blank",
            ));
        }

        let urls = [
            ("SPOTIFY_REDIRECT_URL", &self.spotify_redirect_url),
            ("SPOTIFY_ACCOUNTS_URL", &self.spotify_accounts_url),
            ("SPOTIFY_API_URL", &self.spotify_api_url),
            ("NETEASE_API_URL", &self.netease_api_url),
            ("FRONTEND_URL", &self.frontend_url),
        ];
        for (name, value) in urls {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::Invalid(name, "must be an http(s) URL"));
            }
        }

        if self.http_timeout.is_zero() || self.transfer_timeout.is_zero() {
            return Err(ConfigError::Invalid("*_TIMEOUT_SECS", "must be positive"));
        }

        Ok(())
    }
}

fn parse_secs(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
