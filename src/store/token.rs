// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user OAuth credential storage.

use crate::error::AppError;
use crate::models::Credential;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Credential storage keyed by user ID.
///
/// Backend failures are reported as `AppError::Storage`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store (or replace) the credential for a user.
    async fn put(&self, user_id: &str, credential: Credential) -> Result<(), AppError>;

    /// Fetch the credential for a user, `None` if absent.
    async fn get(&self, user_id: &str) -> Result<Option<Credential>, AppError>;

    /// Remove the credential for a user. Removing an absent record is not an error.
    async fn delete(&self, user_id: &str) -> Result<(), AppError>;

    /// Whether the user has a credential whose access token has not expired.
    ///
    /// Fails closed: a missing record or a storage error reads as invalid.
    async fn is_valid(&self, user_id: &str) -> bool {
        match self.get(user_id).await {
            Ok(Some(credential)) => credential.is_valid(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, user_id, "Credential lookup failed, treating as invalid");
                false
            }
        }
    }
}

/// In-memory credential store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<String, Credential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, user_id: &str, credential: Credential) -> Result<(), AppError> {
        self.tokens
            .write()
            .await
            .insert(user_id.to_string(), credential);
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<Credential>, AppError> {
        Ok(self.tokens.read().await.get(user_id).cloned())
    }

    async fn delete(&self, user_id: &str) -> Result<(), AppError> {
        self.tokens.write().await.remove(user_id);
        Ok(())
    }
}
