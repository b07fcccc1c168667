// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cross-catalog track matching and batched playlist submission.
//!
//! Tracks are processed in chunks of [`BATCH_LIMIT`]. Within a chunk every
//! track is searched sequentially, then all matches go out in a single
//! bulk add. Per-track problems are recorded in the [`TransferResult`],
//! never raised as an error.

use crate::error::AppError;
use crate::models::{FailureKind, Track, TransferResult};
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Spotify's per-call ceiling for adding tracks to a playlist.
pub const BATCH_LIMIT: usize = 100;

/// Destination catalog operations the engine needs.
#[async_trait]
pub trait DestinationCatalog: Send + Sync {
    /// Search for a track; `Ok(None)` means no results.
    async fn search_track(&self, query: &str) -> Result<Option<String>, AppError>;

    /// Add tracks (by destination ID) to a playlist in one call.
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), AppError>;
}

/// Build the destination search query for a track.
///
/// Exact-phrase title term, plus an exact-phrase artist term when known.
pub fn build_search_query(track: &Track) -> String {
    let mut parts = Vec::with_capacity(2);
    let title = track.title.trim();
    let artist = track.artist.trim();

    if !title.is_empty() {
        parts.push(format!("track:\"{}\"", strip_quotes(title)));
    }
    if !artist.is_empty() {
        parts.push(format!("artist:\"{}\"", strip_quotes(artist)));
    }

    parts.join(" ")
}

/// Embedded double quotes would terminate the phrase early.
fn strip_quotes(term: &str) -> String {
    term.replace('"', "")
}

/// Stateless transfer engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferEngine;

/// A track that search matched, waiting for its chunk's bulk add.
struct Candidate<'a> {
    track: &'a Track,
    id: String,
}

impl TransferEngine {
    pub fn new() -> Self {
        Self
    }

    /// Match and submit `tracks` to `playlist_id`.
    ///
    /// Only fails when `playlist_id` is empty. Cancellation stops work between
    /// tracks or chunks (and aborts an in-flight call) and returns the partial
    /// result with `cancelled` set.
    pub async fn transfer(
        &self,
        client: &dyn DestinationCatalog,
        playlist_id: &str,
        tracks: &[Track],
        cancel: &CancellationToken,
    ) -> Result<TransferResult, AppError> {
        if playlist_id.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "playlist ID cannot be empty".to_string(),
            ));
        }

        let mut result = TransferResult::new(tracks.len());

        for (index, chunk) in tracks.chunks(BATCH_LIMIT).enumerate() {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            tracing::debug!(
                playlist_id,
                chunk = index,
                size = chunk.len(),
                "Processing transfer chunk"
            );

            if !self
                .process_chunk(client, playlist_id, chunk, cancel, &mut result)
                .await
            {
                result.cancelled = true;
                break;
            }
        }

        tracing::info!(
            playlist_id,
            total = result.total_tracks,
            succeeded = result.success_count,
            failed = result.failed_tracks.len(),
            cancelled = result.cancelled,
            "Transfer finished"
        );

        Ok(result)
    }

    /// Search then submit one chunk. Returns `false` if cancelled midway.
    async fn process_chunk(
        &self,
        client: &dyn DestinationCatalog,
        playlist_id: &str,
        chunk: &[Track],
        cancel: &CancellationToken,
        result: &mut TransferResult,
    ) -> bool {
        let mut candidates: Vec<Candidate<'_>> = Vec::with_capacity(chunk.len());

        for track in chunk {
            if cancel.is_cancelled() {
                abandon(&candidates, result);
                return false;
            }

            let query = build_search_query(track);
            let Some(outcome) = cancellable(cancel, client.search_track(&query)).await else {
                abandon(&candidates, result);
                return false;
            };

            match outcome {
                Ok(Some(id)) => candidates.push(Candidate { track, id }),
                Ok(None) => result.fail(
                    track,
                    FailureKind::NotFound,
                    format!(
                        "not found: no results for track: {} by {}",
                        track.title, track.artist
                    ),
                ),
                Err(e) => result.fail(
                    track,
                    FailureKind::SearchError,
                    format!("search failed for track {}: {}", track.title, e),
                ),
            }
        }

        if candidates.is_empty() {
            return true;
        }

        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let Some(outcome) = cancellable(cancel, client.add_tracks(playlist_id, &ids)).await else {
            abandon(&candidates, result);
            return false;
        };

        match outcome {
            Ok(()) => {
                result.success_count += ids.len();
                result.success_tracks.extend(ids);
            }
            Err(e) => {
                tracing::warn!(
                    playlist_id,
                    count = candidates.len(),
                    error = %e,
                    "Bulk add failed, marking matched tracks as failed"
                );
                let reason = format!("failed to add to playlist: {}", e);
                for candidate in &candidates {
                    result.fail(candidate.track, FailureKind::BatchAddError, reason.clone());
                }
            }
        }

        true
    }
}

/// Record matched-but-unsubmitted tracks of an interrupted chunk.
fn abandon(candidates: &[Candidate<'_>], result: &mut TransferResult) {
    for candidate in candidates {
        result.fail(
            candidate.track,
            FailureKind::Cancelled,
            "transfer cancelled before the track was added".to_string(),
        );
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}
