// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Playlist-Bridge: copy NetEase Cloud Music playlists into Spotify
//!
//! This crate provides the backend API: Spotify OAuth with server-side
//! sessions, NetEase playlist normalization, and the batched track
//! matching/transfer engine.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use config::{Config, ConfigError};
use services::{NeteaseService, OAuthCoordinator, TransferEngine};
use std::sync::Arc;
use store::{MemorySessionStore, MemoryTokenStore, SessionStore, TokenStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
    pub oauth: OAuthCoordinator,
    pub netease: NeteaseService,
    pub transfer: TransferEngine,
}

impl AppState {
    /// Build all services over the given stores.
    ///
    /// Fails if the configuration cannot support an OAuth flow.
    pub fn new(
        config: Config,
        tokens: Arc<dyn TokenStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let oauth = OAuthCoordinator::new(&config, http.clone(), tokens)?;
        let netease = NeteaseService::new(http, &config.netease_api_url);

        Ok(Self {
            config,
            sessions,
            oauth,
            netease,
            transfer: TransferEngine::new(),
        })
    }

    /// Build all services over fresh in-memory stores.
    pub fn in_memory(config: Config) -> Result<Self, ConfigError> {
        Self::new(
            config,
            Arc::new(MemoryTokenStore::new()),
            Arc::new(MemorySessionStore::new()),
        )
    }
}
