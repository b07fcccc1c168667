// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify (destination) routes for authenticated sessions.

use super::RouteHandler;
use crate::error::{AppError, Result};
use crate::middleware::{require_destination_auth, AuthedDestination};
use crate::models::{Track, TransferResult};
use crate::services::spotify::PlaylistInfo;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Routes that require the session gate.
pub struct DestinationRoutes;

impl RouteHandler for DestinationRoutes {
    fn register(
        &self,
        router: Router<Arc<AppState>>,
        state: &Arc<AppState>,
    ) -> Router<Arc<AppState>> {
        let protected = Router::new()
            .route("/spotify/me", get(get_me))
            .route("/spotify/playlists", get(get_playlists))
            .route("/spotify/playlists/{id}/tracks", post(add_tracks))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_destination_auth,
            ));

        router.merge(protected)
    }
}

// ─── User Profile ────────────────────────────────────────────

/// Current Spotify user response.
#[derive(Serialize)]
pub struct MeResponse {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub followers: u64,
    pub country: Option<String>,
}

/// Get the current user's Spotify profile.
async fn get_me(Extension(authed): Extension<AuthedDestination>) -> Result<Json<MeResponse>> {
    let user = authed.client.current_user().await?;

    Ok(Json(MeResponse {
        id: user.id,
        display_name: user.display_name,
        email: user.email,
        followers: user.followers.map(|f| f.total).unwrap_or_default(),
        country: user.country,
    }))
}

// ─── Playlists ───────────────────────────────────────────────

/// List the current user's Spotify playlists.
async fn get_playlists(
    Extension(authed): Extension<AuthedDestination>,
) -> Result<Json<Vec<PlaylistInfo>>> {
    let playlists = authed.client.current_user_playlists().await?;
    tracing::debug!(user_id = %authed.user_id, count = playlists.len(), "Listed playlists");
    Ok(Json(playlists))
}

// ─── Transfer ────────────────────────────────────────────────

/// Track supplied directly in a transfer request.
#[derive(Debug, Deserialize)]
pub struct TrackInput {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
}

/// Transfer request body. Explicit tracks come first, then bare titles,
/// then the tracks of `source_playlist_id` if given.
#[derive(Debug, Default, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub tracks: Vec<TrackInput>,
    #[serde(default)]
    pub track_names: Vec<String>,
    #[serde(default)]
    pub source_playlist_id: Option<i64>,
}

#[derive(Serialize)]
pub struct TransferResponse {
    pub message: String,
    pub result: TransferResult,
}

/// Match the requested tracks on Spotify and add them to playlist `id`.
async fn add_tracks(
    State(state): State<Arc<AppState>>,
    Extension(authed): Extension<AuthedDestination>,
    Path(playlist_id): Path<String>,
    body: std::result::Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = body.map_err(|e| AppError::InvalidArgument(e.body_text()))?;

    let mut tracks: Vec<Track> = request
        .tracks
        .into_iter()
        .map(|t| Track::new(t.title, t.artist, t.album))
        .collect();
    tracks.extend(request.track_names.into_iter().map(Track::from_title));

    if let Some(source_id) = request.source_playlist_id {
        let snapshot = state.netease.fetch_playlist(source_id).await?;
        tracks.extend(snapshot.tracks);
    }

    tracing::info!(
        user_id = %authed.user_id,
        playlist_id = %playlist_id,
        tracks = tracks.len(),
        "Starting transfer"
    );

    // Abort the engine (keeping its partial result) once the deadline passes.
    let cancel = CancellationToken::new();
    let deadline = {
        let cancel = cancel.clone();
        let timeout = state.config.transfer_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            cancel.cancel();
        })
    };
    let _cancel_on_drop = cancel.clone().drop_guard();

    let outcome = state
        .transfer
        .transfer(&authed.client, &playlist_id, &tracks, &cancel)
        .await;
    deadline.abort();

    match outcome {
        Ok(result) => {
            let message = if result.cancelled {
                "transfer stopped before completion"
            } else {
                "transfer complete"
            };
            Ok(Json(TransferResponse {
                message: message.to_string(),
                result,
            })
            .into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, playlist_id = %playlist_id, "Transfer failed");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "transfer_failed",
                    "details": e.to_string(),
                })),
            )
                .into_response())
        }
    }
}
