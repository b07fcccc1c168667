// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transfer engine tests against a scripted destination catalog.

use async_trait::async_trait;
use playlist_bridge::error::AppError;
use playlist_bridge::models::{FailureKind, Track};
use playlist_bridge::services::transfer::{build_search_query, BATCH_LIMIT};
use playlist_bridge::services::{DestinationCatalog, TransferEngine};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Catalog whose behavior is driven by the searched title.
///
/// - titles in `missing` return no results
/// - titles in `broken` make the search fail
/// - everything else matches `id-<title>`
#[derive(Default)]
struct ScriptedCatalog {
    missing: HashSet<String>,
    broken: HashSet<String>,
    fail_adds: bool,
    /// Cancel this token once this many searches have run.
    cancel_after: Option<(usize, CancellationToken)>,
    searches: AtomicUsize,
    adds: Mutex<Vec<Vec<String>>>,
}

impl ScriptedCatalog {
    fn add_calls(&self) -> Vec<Vec<String>> {
        self.adds.lock().unwrap().clone()
    }
}

fn title_of(query: &str) -> String {
    let start = query.find("track:\"").unwrap() + "track:\"".len();
    let rest = &query[start..];
    rest[..rest.find('"').unwrap()].to_string()
}

#[async_trait]
impl DestinationCatalog for ScriptedCatalog {
    async fn search_track(&self, query: &str) -> Result<Option<String>, AppError> {
        let count = self.searches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, token)) = &self.cancel_after {
            if count >= *after {
                token.cancel();
            }
        }

        let title = title_of(query);
        if self.broken.contains(&title) {
            return Err(AppError::SpotifyApi("HTTP 500: search down".to_string()));
        }
        if self.missing.contains(&title) {
            return Ok(None);
        }
        Ok(Some(format!("id-{}", title)))
    }

    async fn add_tracks(&self, _playlist_id: &str, track_ids: &[String]) -> Result<(), AppError> {
        self.adds.lock().unwrap().push(track_ids.to_vec());
        if self.fail_adds {
            return Err(AppError::SpotifyApi("HTTP 502: playlist locked".to_string()));
        }
        Ok(())
    }
}

fn numbered_tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| Track::new(format!("Song {}", i), "Artist", None))
        .collect()
}

#[tokio::test]
async fn test_found_and_missing_track() {
    let catalog = ScriptedCatalog {
        missing: HashSet::from(["Missing".to_string()]),
        ..Default::default()
    };
    let tracks = vec![
        Track::new("Hello", "Adele", None),
        Track::new("Missing", "Nobody", None),
    ];

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &tracks, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.total_tracks, 2);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.success_tracks, vec!["id-Hello"]);
    assert_eq!(result.failed_tracks.len(), 1);
    assert_eq!(result.failed_tracks[0].kind, FailureKind::NotFound);
    assert_eq!(
        result.failed_tracks[0].error,
        "not found: no results for track: Missing by Nobody"
    );
    assert!(!result.cancelled);
    assert_eq!(catalog.add_calls(), vec![vec!["id-Hello".to_string()]]);
}

#[tokio::test]
async fn test_failed_bulk_add_marks_every_match() {
    let catalog = ScriptedCatalog {
        fail_adds: true,
        ..Default::default()
    };
    let tracks = numbered_tracks(3);

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &tracks, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.success_count, 0);
    assert!(result.success_tracks.is_empty());
    assert_eq!(result.failed_tracks.len(), 3);
    for failed in &result.failed_tracks {
        assert_eq!(failed.kind, FailureKind::BatchAddError);
        assert!(failed.error.starts_with("failed to add to playlist: "));
    }
    assert_eq!(catalog.add_calls().len(), 1);
}

#[tokio::test]
async fn test_search_error_is_recorded_per_track() {
    let catalog = ScriptedCatalog {
        broken: HashSet::from(["Song 1".to_string()]),
        ..Default::default()
    };
    let tracks = numbered_tracks(3);

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &tracks, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.success_count, 2);
    assert_eq!(result.failed_tracks.len(), 1);
    assert_eq!(result.failed_tracks[0].kind, FailureKind::SearchError);
    assert!(result.failed_tracks[0]
        .error
        .starts_with("search failed for track Song 1: "));
    assert_eq!(result.failed_tracks[0].track.title, "Song 1");
}

#[tokio::test]
async fn test_chunks_of_batch_limit() {
    let catalog = ScriptedCatalog::default();
    let tracks = numbered_tracks(BATCH_LIMIT * 2 + 1);

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &tracks, &CancellationToken::new())
        .await
        .unwrap();

    let adds = catalog.add_calls();
    assert_eq!(adds.len(), 3);
    assert_eq!(adds[0].len(), BATCH_LIMIT);
    assert_eq!(adds[1].len(), BATCH_LIMIT);
    assert_eq!(adds[2].len(), 1);
    assert_eq!(result.success_count, BATCH_LIMIT * 2 + 1);

    // Submission order follows input order
    let expected: Vec<String> = tracks.iter().map(|t| format!("id-{}", t.title)).collect();
    assert_eq!(result.success_tracks, expected);
}

#[tokio::test]
async fn test_chunk_without_matches_skips_add() {
    let missing: HashSet<String> = (BATCH_LIMIT..BATCH_LIMIT + 5)
        .map(|i| format!("Song {}", i))
        .collect();
    let catalog = ScriptedCatalog {
        missing,
        ..Default::default()
    };
    let tracks = numbered_tracks(BATCH_LIMIT + 5);

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &tracks, &CancellationToken::new())
        .await
        .unwrap();

    // Second chunk had no matches, so only the first chunk is submitted
    assert_eq!(catalog.add_calls().len(), 1);
    assert_eq!(result.success_count, BATCH_LIMIT);
    assert_eq!(result.failed_tracks.len(), 5);
}

#[tokio::test]
async fn test_every_track_accounted_for() {
    let catalog = ScriptedCatalog {
        missing: HashSet::from(["Song 2".to_string(), "Song 7".to_string()]),
        broken: HashSet::from(["Song 4".to_string()]),
        ..Default::default()
    };
    let tracks = numbered_tracks(10);

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &tracks, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.total_tracks, 10);
    assert_eq!(result.processed(), result.total_tracks);
    assert_eq!(result.success_count, result.success_tracks.len());
    assert_eq!(result.success_count, 7);
}

#[tokio::test]
async fn test_empty_track_list() {
    let catalog = ScriptedCatalog::default();

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &[], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.total_tracks, 0);
    assert_eq!(result.success_count, 0);
    assert!(result.failed_tracks.is_empty());
    assert!(catalog.add_calls().is_empty());
}

#[tokio::test]
async fn test_empty_playlist_id_rejected() {
    let catalog = ScriptedCatalog::default();

    let result = TransferEngine::new()
        .transfer(&catalog, "  ", &numbered_tracks(2), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    assert_eq!(catalog.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let catalog = ScriptedCatalog::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &numbered_tracks(4), &cancel)
        .await
        .unwrap();

    assert!(result.cancelled);
    assert_eq!(result.processed(), 0);
    assert_eq!(catalog.searches.load(Ordering::SeqCst), 0);
    assert!(catalog.add_calls().is_empty());
}

#[tokio::test]
async fn test_cancelled_mid_chunk_keeps_partial_result() {
    let cancel = CancellationToken::new();
    let catalog = ScriptedCatalog {
        cancel_after: Some((2, cancel.clone())),
        ..Default::default()
    };
    let tracks = numbered_tracks(5);

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &tracks, &cancel)
        .await
        .unwrap();

    assert!(result.cancelled);
    assert_eq!(result.success_count, 0);
    assert!(catalog.add_calls().is_empty());

    // Matched tracks that never reached the bulk add are reported
    assert!(result.failed_tracks.len() <= 2);
    assert!(result
        .failed_tracks
        .iter()
        .all(|f| f.kind == FailureKind::Cancelled));
    assert!(result.processed() < result.total_tracks);
}

#[tokio::test]
async fn test_cancellation_before_bulk_add_abandons_chunk() {
    let cancel = CancellationToken::new();
    let catalog = ScriptedCatalog {
        cancel_after: Some((BATCH_LIMIT, cancel.clone())),
        ..Default::default()
    };
    let tracks = numbered_tracks(BATCH_LIMIT + 10);

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &tracks, &cancel)
        .await
        .unwrap();

    // The last search of chunk one fired the token, so its bulk add never runs
    assert!(result.cancelled);
    assert!(catalog.add_calls().is_empty());
    assert_eq!(result.success_count, 0);
    assert_eq!(result.failed_tracks.len(), BATCH_LIMIT);
    assert!(result
        .failed_tracks
        .iter()
        .all(|f| f.kind == FailureKind::Cancelled));
}

#[tokio::test]
async fn test_cancellation_keeps_submitted_chunks() {
    let cancel = CancellationToken::new();
    let catalog = ScriptedCatalog {
        cancel_after: Some((BATCH_LIMIT + 1, cancel.clone())),
        ..Default::default()
    };
    let tracks = numbered_tracks(BATCH_LIMIT + 10);

    let result = TransferEngine::new()
        .transfer(&catalog, "pl-1", &tracks, &cancel)
        .await
        .unwrap();

    assert!(result.cancelled);
    assert_eq!(catalog.add_calls().len(), 1);
    assert_eq!(result.success_count, BATCH_LIMIT);
    assert_eq!(result.failed_tracks.len(), 1);
    assert_eq!(result.failed_tracks[0].kind, FailureKind::Cancelled);
    assert_eq!(result.processed(), BATCH_LIMIT + 1);
}

#[test]
fn test_query_shape_used_for_search() {
    let track = Track::new("Numb", "Linkin Park, Jay-Z", None);
    assert_eq!(
        build_search_query(&track),
        r#"track:"Numb" artist:"Linkin Park, Jay-Z""#
    );
}
