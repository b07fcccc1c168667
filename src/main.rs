// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Playlist-Bridge API Server
//!
//! Copies NetEase Cloud Music playlists into a user's Spotify account.

use playlist_bridge::{config::Config, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment; bad OAuth settings are fatal here
    let config = Config::from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;
    tracing::info!(port = config.port, "Starting Playlist-Bridge API");

    // Tokens and sessions live in memory for the lifetime of the process
    let state = Arc::new(AppState::in_memory(config.clone())?);
    tracing::info!(
        netease = %config.netease_api_url,
        spotify = %config.spotify_api_url,
        "Services initialized"
    );

    // Build router
    let app = playlist_bridge::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    // Peer addresses feed the session key when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("playlist_bridge=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
