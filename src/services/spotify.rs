// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify Web API client bound to one user's access token.
//!
//! Handles:
//! - Current user profile and playlists
//! - Track search
//! - Bulk playlist additions
//! - Rate limit / token error detection

use crate::error::AppError;
use crate::services::transfer::DestinationCatalog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Page size used when listing the user's playlists.
const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Upper bound on playlist pages fetched for one listing.
const MAX_PLAYLIST_PAGES: u32 = 20;

/// Authenticated Spotify API client.
#[derive(Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SpotifyClient {
    /// Create a client that authenticates every call with `access_token`.
    pub fn new(http: reqwest::Client, base_url: &str, access_token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// The bearer token this client uses.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the current user's profile.
    pub async fn current_user(&self) -> Result<SpotifyUser, AppError> {
        let url = format!("{}/me", self.base_url);
        self.get_json(&url, &[]).await
    }

    /// List the current user's playlists (all pages).
    pub async fn current_user_playlists(&self) -> Result<Vec<PlaylistInfo>, AppError> {
        let url = format!("{}/me/playlists", self.base_url);
        let mut playlists = Vec::new();

        for page in 0..MAX_PLAYLIST_PAGES {
            let offset = page * PLAYLIST_PAGE_SIZE;
            let response: Paging<SpotifyPlaylist> = self
                .get_json(
                    &url,
                    &[
                        ("limit", PLAYLIST_PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;

            let page_len = response.items.len();
            playlists.extend(response.items.into_iter().map(|p| PlaylistInfo {
                id: p.id,
                name: p.name,
                track_count: p.tracks.map(|t| t.total).unwrap_or_default(),
            }));

            if response.next.is_none() || page_len < PLAYLIST_PAGE_SIZE as usize {
                break;
            }
        }

        Ok(playlists)
    }

    /// Search for a track, returning the ID of the first hit.
    pub async fn search_first_track(&self, query: &str) -> Result<Option<String>, AppError> {
        let url = format!("{}/search", self.base_url);
        let response: SearchResponse = self
            .get_json(
                &url,
                &[
                    ("q", query.to_string()),
                    ("type", "track".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        Ok(response
            .tracks
            .and_then(|page| page.items.into_iter().next())
            .map(|track| track.id))
    }

    /// Append tracks to a playlist in one call (Spotify accepts up to 100).
    pub async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<String, AppError> {
        let url = format!(
            "{}/playlists/{}/tracks",
            self.base_url,
            urlencoding::encode(playlist_id)
        );
        let uris: Vec<String> = track_ids
            .iter()
            .map(|id| format!("spotify:track:{}", id))
            .collect();

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "uris": uris }))
            .send()
            .await
            .map_err(|e| AppError::SpotifyApi(e.to_string()))?;

        let snapshot: SnapshotResponse = check_response_json(response).await?;
        Ok(snapshot.snapshot_id)
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::SpotifyApi(e.to_string()))?;

        check_response_json(response).await
    }
}

#[async_trait]
impl DestinationCatalog for SpotifyClient {
    async fn search_track(&self, query: &str) -> Result<Option<String>, AppError> {
        self.search_first_track(query).await
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), AppError> {
        self.add_tracks_to_playlist(playlist_id, track_ids)
            .await
            .map(|_| ())
    }
}

/// Check response status and parse the JSON body.
pub(crate) async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Spotify rate limit hit (429)");
            return Err(AppError::SpotifyApi(
                AppError::SPOTIFY_RATE_LIMIT.to_string(),
            ));
        }

        if status.as_u16() == 401 {
            return Err(AppError::SpotifyApi(
                AppError::SPOTIFY_TOKEN_ERROR.to_string(),
            ));
        }

        return Err(AppError::SpotifyApi(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::SpotifyApi(format!("JSON parse error: {}", e)))
}

/// Spotify user profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub followers: Option<Followers>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Followers {
    pub total: u64,
}

/// Playlist summary returned to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistInfo {
    pub id: String,
    pub name: String,
    pub track_count: u32,
}

/// Generic Spotify paging object.
#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyPlaylist {
    id: String,
    name: String,
    #[serde(default)]
    tracks: Option<TrackTotal>,
}

#[derive(Debug, Deserialize)]
struct TrackTotal {
    total: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: Option<Paging<SearchTrack>>,
}

#[derive(Debug, Deserialize)]
struct SearchTrack {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    snapshot_id: String,
}
