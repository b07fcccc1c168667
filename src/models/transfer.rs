// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transfer outcome model.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::Track;

/// Why a track did not make it into the destination playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Search returned no results
    NotFound,
    /// Search call failed
    SearchError,
    /// Matched, but the bulk add for its chunk failed
    BatchAddError,
    /// Matched, but the transfer was cancelled before submission
    Cancelled,
}

/// A track that failed to transfer, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FailedTrack {
    pub track: Track,
    pub kind: FailureKind,
    pub error: String,
}

/// Outcome of a transfer run.
///
/// Without cancellation every input track appears exactly once, either in
/// `success_tracks` (by destination ID) or in `failed_tracks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TransferResult {
    pub total_tracks: usize,
    pub success_count: usize,
    pub failed_tracks: Vec<FailedTrack>,
    /// Spotify track IDs added to the playlist
    pub success_tracks: Vec<String>,
    /// Whether the run stopped before processing every track
    pub cancelled: bool,
}

impl TransferResult {
    /// Empty result for a run over `total_tracks` tracks.
    pub fn new(total_tracks: usize) -> Self {
        Self {
            total_tracks,
            ..Self::default()
        }
    }

    pub(crate) fn fail(&mut self, track: &Track, kind: FailureKind, error: String) {
        self.failed_tracks.push(FailedTrack {
            track: track.clone(),
            kind,
            error,
        });
    }

    /// Number of tracks accounted for so far.
    pub fn processed(&self) -> usize {
        self.success_tracks.len() + self.failed_tracks.len()
    }
}
