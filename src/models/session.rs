// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authentication state for one session key.
///
/// Holds at most one outstanding CSRF challenge. Issuing a new challenge
/// replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Internal user ID (the Spotify user ID in this deployment)
    pub user_id: String,
    /// Spotify user ID
    pub destination_user_id: String,
    /// Whether the OAuth flow completed for this session.
    /// `true` implies `user_id` is non-empty.
    pub is_authed: bool,
    /// When the OAuth flow completed
    pub auth_time: Option<DateTime<Utc>>,
    /// Outstanding OAuth `state` value
    pub pending_state: Option<String>,
    /// When `pending_state` stops being accepted
    pub pending_state_expiry: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// Session for a user who just completed the OAuth flow.
    pub fn authenticated(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            destination_user_id: user_id.to_string(),
            is_authed: !user_id.is_empty(),
            auth_time: Some(now),
            pending_state: None,
            pending_state_expiry: None,
        }
    }

    /// The authenticated user ID, if this session is authenticated.
    pub fn authed_user(&self) -> Option<&str> {
        (self.is_authed && !self.user_id.is_empty()).then_some(self.user_id.as_str())
    }
}
