// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and CSRF challenge storage.
//!
//! Sessions are keyed by a coarse caller fingerprint (client IP plus
//! User-Agent, see [`crate::middleware::session::SessionKey`]). Two clients
//! that share both values share a session. This is a known limitation.

use crate::error::AppError;
use crate::models::AuthSession;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

/// How long an issued OAuth `state` stays acceptable.
pub const CHALLENGE_TTL_MINUTES: i64 = 10;

/// Session storage keyed by session key.
///
/// Backend failures are reported as `AppError::Storage`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store (or replace) the session record.
    async fn set(&self, key: &str, session: AuthSession) -> Result<(), AppError>;

    /// Fetch the session record, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<AuthSession>, AppError>;

    /// Remove the session record.
    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// Record `state` as the single outstanding challenge for this session,
    /// creating the session if needed and replacing any earlier challenge.
    async fn set_challenge(&self, key: &str, state: &str) -> Result<(), AppError>;

    /// Whether `state` matches the outstanding, unexpired challenge.
    ///
    /// The challenge is not consumed; it stays valid until it expires or
    /// is replaced.
    async fn validate_challenge(&self, key: &str, state: &str) -> bool;
}

/// In-memory session store. Contents are lost on restart.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, AuthSession>>,
    challenge_ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_challenge_ttl(Duration::minutes(CHALLENGE_TTL_MINUTES))
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a non-default challenge lifetime.
    pub fn with_challenge_ttl(challenge_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            challenge_ttl,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, session: AuthSession) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .insert(key.to_string(), session);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<AuthSession>, AppError> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.sessions.write().await.remove(key);
        Ok(())
    }

    async fn set_challenge(&self, key: &str, state: &str) -> Result<(), AppError> {
        let expiry = Utc::now() + self.challenge_ttl;
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(key.to_string()).or_default();
        session.pending_state = Some(state.to_string());
        session.pending_state_expiry = Some(expiry);
        Ok(())
    }

    async fn validate_challenge(&self, key: &str, state: &str) -> bool {
        let sessions = self.sessions.read().await;
        let Some(session) = sessions.get(key) else {
            return false;
        };

        let (Some(pending), Some(expiry)) = (&session.pending_state, session.pending_state_expiry)
        else {
            return false;
        };

        let matches: bool = pending.as_bytes().ct_eq(state.as_bytes()).into();
        matches && Utc::now() < expiry
    }
}
