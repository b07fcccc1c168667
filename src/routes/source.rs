// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NetEase (source catalog) routes.

use super::RouteHandler;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Public routes for reading source playlists.
pub struct SourceRoutes;

impl RouteHandler for SourceRoutes {
    fn register(
        &self,
        router: Router<Arc<AppState>>,
        _state: &Arc<AppState>,
    ) -> Router<Arc<AppState>> {
        router.route("/netease/playlist", get(get_playlist))
    }
}

#[derive(Deserialize)]
struct PlaylistQuery {
    #[serde(default)]
    id: Option<String>,
}

/// Fetch and normalize a NetEase playlist.
///
/// Failures are reported as a 200 with an error body so the frontend can
/// show the reason inline.
async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlaylistQuery>,
) -> Response {
    let result = match parse_source_id(params.id.as_deref()) {
        Ok(id) => state.netease.fetch_playlist(id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch NetEase playlist");
            Json(e.body()).into_response()
        }
    }
}

fn parse_source_id(raw: Option<&str>) -> Result<i64, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidArgument("missing playlist ID".to_string()))?;

    raw.parse::<i64>()
        .map_err(|_| AppError::InvalidArgument(format!("invalid playlist ID: {}", raw)))
}
