// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user OAuth credential model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's Spotify OAuth tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Spotify user ID the tokens belong to (empty until bound after exchange)
    pub user_id: String,
    /// Bearer access token
    pub access_token: String,
    /// Refresh token used to mint new access tokens
    pub refresh_token: String,
    /// Token type reported by the token endpoint (normally "Bearer")
    pub token_type: String,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
    /// Granted OAuth scopes
    pub scopes: Vec<String>,
}

impl Credential {
    /// Whether the access token is still usable at `now`.
    ///
    /// A token is usable only while `expires_at` is strictly in the future.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether the access token is still usable right now.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}
