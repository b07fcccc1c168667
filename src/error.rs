// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("No credential stored for user {0}")]
    CredentialNotFound(String),

    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("Spotify API error: {0}")]
    SpotifyApi(String),

    /// Failure inside a token or session store backend
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message used when Spotify rate limits a request.
    pub const SPOTIFY_RATE_LIMIT: &'static str = "Rate limit exceeded";

    /// Message used when Spotify rejects the access token.
    pub const SPOTIFY_TOKEN_ERROR: &'static str = "Invalid or expired access token";

    /// Whether this error means the caller must re-authenticate.
    pub fn is_auth_error(&self) -> bool {
        match self {
            AppError::Unauthenticated
            | AppError::AuthenticationFailed(_)
            | AppError::CredentialNotFound(_)
            | AppError::Refresh(_) => true,
            AppError::SpotifyApi(msg) => msg == Self::SPOTIFY_TOKEN_ERROR,
            _ => false,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<String>,
}

impl AppError {
    /// Stable machine-readable code used in JSON bodies and redirects.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::Upstream(_) => "upstream_error",
            AppError::Decode(_) => "decode_error",
            AppError::Unauthenticated => "spotify_auth_required",
            AppError::AuthenticationFailed(_) => "authentication_failed",
            AppError::CredentialNotFound(_) => "credential_not_found",
            AppError::Exchange(_) => "token_exchange_failed",
            AppError::Refresh(_) => "token_refresh_failed",
            AppError::SpotifyApi(_) => "spotify_error",
            AppError::Storage(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub(crate) fn body(&self) -> ErrorResponse {
        let details = match self {
            AppError::Unauthenticated | AppError::Storage(_) | AppError::Internal(_) => None,
            other => Some(other.to_string()),
        };
        ErrorResponse {
            error: self.code().to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated
            | AppError::AuthenticationFailed(_)
            | AppError::CredentialNotFound(_) => StatusCode::UNAUTHORIZED,
            AppError::Upstream(_)
            | AppError::Decode(_)
            | AppError::Exchange(_)
            | AppError::Refresh(_)
            | AppError::SpotifyApi(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
