// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalized track and playlist models shared by both catalogs.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A catalog-independent track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Track {
    pub title: String,
    /// Comma-joined contributor names; may be empty
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Normalized `title[|artist]`, see [`match_key`]
    pub match_key: String,
}

impl Track {
    /// Build a track, deriving its match key.
    pub fn new(title: impl Into<String>, artist: impl Into<String>, album: Option<String>) -> Self {
        let title = title.into();
        let artist = artist.into();
        let match_key = match_key(&title, &artist);
        Self {
            title,
            artist,
            album,
            match_key,
        }
    }

    /// A title-only track (artist unknown).
    pub fn from_title(title: impl Into<String>) -> Self {
        Self::new(title, String::new(), None)
    }
}

/// Normalized identity of a track used for dedup and debugging.
///
/// Lower-cased, trimmed title; if the trimmed artist is non-empty, followed by `|`
/// and the lower-cased, trimmed artist.
pub fn match_key(title: &str, artist: &str) -> String {
    let mut key = title.trim().to_lowercase();
    let artist = artist.trim();
    if !artist.is_empty() {
        key.push('|');
        key.push_str(&artist.to_lowercase());
    }
    key
}

/// A playlist fetched from the source catalog.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlaylistSnapshot {
    pub name: String,
    /// Source catalog playlist ID
    #[serde(rename = "id")]
    pub source_id: String,
    /// Track count declared by the source catalog
    pub track_count: u32,
    pub tracks: Vec<Track>,
}
