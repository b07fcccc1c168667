// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NetEase Cloud Music playlist fetching and normalization.

use crate::error::AppError;
use crate::models::{PlaylistSnapshot, Track};
use serde::Deserialize;

/// Playlist detail endpoint, relative to the NetEase base URL.
const PLAYLIST_DETAIL_PATH: &str = "/api/v6/playlist/detail";

/// `code` value NetEase reports on success.
const SUCCESS_CODE: i64 = 200;

/// Source catalog adapter for NetEase playlists.
#[derive(Clone)]
pub struct NeteaseService {
    http: reqwest::Client,
    base_url: String,
}

impl NeteaseService {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a playlist and normalize its tracks.
    ///
    /// Fails as a whole: no partial snapshot is ever returned.
    pub async fn fetch_playlist(&self, source_id: i64) -> Result<PlaylistSnapshot, AppError> {
        if source_id <= 0 {
            return Err(AppError::InvalidArgument(format!(
                "invalid playlist ID: {}",
                source_id
            )));
        }

        let url = format!("{}{}", self.base_url, PLAYLIST_DETAIL_PATH);
        let response = self
            .http
            .post(&url)
            .form(&[("id", source_id.to_string())])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to fetch playlist: {}", e)))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to read response: {}", e)))?;

        let detail: PlaylistResponse = serde_json::from_slice(&body)
            .map_err(|e| AppError::Decode(format!("failed to decode response: {}", e)))?;

        if detail.code != SUCCESS_CODE {
            tracing::warn!(source_id, code = detail.code, "NetEase returned error code");
            return Err(AppError::Upstream(format!(
                "API returned error code: {}",
                detail.code
            )));
        }

        let playlist = detail.playlist.ok_or_else(|| {
            AppError::Decode("response is missing the playlist object".to_string())
        })?;

        let snapshot = to_snapshot(playlist);
        tracing::info!(
            source_id,
            name = %snapshot.name,
            tracks = snapshot.tracks.len(),
            "Fetched NetEase playlist"
        );
        Ok(snapshot)
    }
}

/// Map the raw NetEase playlist into the internal model, preserving order.
fn to_snapshot(playlist: RawPlaylist) -> PlaylistSnapshot {
    let tracks = playlist
        .tracks
        .into_iter()
        .map(|raw| {
            let artist = raw
                .ar
                .iter()
                .filter_map(|a| a.name.as_deref())
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            Track::new(raw.name, artist, raw.al.and_then(|al| al.name))
        })
        .collect();

    PlaylistSnapshot {
        name: playlist.name,
        source_id: playlist.id.to_string(),
        track_count: playlist.track_count,
        tracks,
    }
}

/// Playlist detail response.
#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    code: i64,
    #[serde(default)]
    playlist: Option<RawPlaylist>,
}

#[derive(Debug, Deserialize)]
struct RawPlaylist {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(rename = "trackCount", default)]
    track_count: u32,
    #[serde(default)]
    tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    #[allow(dead_code)]
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    ar: Vec<RawArtist>,
    #[serde(default)]
    al: Option<RawAlbum>,
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAlbum {
    #[serde(default)]
    name: Option<String>,
}
