// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test harness: fake Spotify and NetEase servers running as local
//! axum apps on ephemeral ports, plus helpers to build the real router
//! against them.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use playlist_bridge::config::Config;
use playlist_bridge::routes::create_router;
use playlist_bridge::store::{MemorySessionStore, MemoryTokenStore};
use playlist_bridge::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Authorization code the fake Spotify accepts.
pub const GOOD_CODE: &str = "good-code";
/// Spotify user ID the fake reports for any valid token.
pub const SPOTIFY_USER: &str = "spotify-user";
/// Access token minted by a refresh.
pub const REFRESHED_ACCESS: &str = "refreshed-access";
/// Playlist ID whose bulk add always fails.
pub const BROKEN_PLAYLIST: &str = "broken-playlist";
/// NetEase playlist IDs with special behavior.
pub const NETEASE_OK: i64 = 24381616;
pub const NETEASE_DENIED: i64 = 401;
pub const NETEASE_GARBAGE: i64 = 13;

/// Observable state of the fake Spotify server.
#[derive(Default)]
pub struct FakeSpotify {
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    /// Refresh grants are rejected with `invalid_grant`
    pub fail_refresh: AtomicBool,
    /// Refresh grants get a 503 from the token endpoint
    pub refresh_unavailable: AtomicBool,
    /// Refresh grants return a token with `expires_in: 0`
    pub refresh_expired: AtomicBool,
    /// Every bulk add: (playlist ID, track IDs)
    pub add_calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeSpotify {
    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn adds(&self) -> Vec<(String, Vec<String>)> {
        self.add_calls.lock().unwrap().clone()
    }
}

/// Serve `app` on an ephemeral local port.
async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a fake Spotify (accounts + Web API) server.
pub async fn spawn_fake_spotify() -> (SocketAddr, Arc<FakeSpotify>) {
    let fake = Arc::new(FakeSpotify::default());
    let app = Router::new()
        .route("/api/token", post(token))
        .route("/v1/me", get(me))
        .route("/v1/me/playlists", get(playlists))
        .route("/v1/search", get(search))
        .route("/v1/playlists/{id}/tracks", post(add_tracks))
        .with_state(fake.clone());

    (serve(app).await, fake)
}

/// Start a fake NetEase server.
pub async fn spawn_fake_netease() -> SocketAddr {
    let app = Router::new().route("/api/v6/playlist/detail", post(playlist_detail));
    serve(app).await
}

async fn token(
    State(fake): State<Arc<FakeSpotify>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let has_client_auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h.starts_with("Basic "));
    if !has_client_auth {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_client"})),
        )
            .into_response();
    }

    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            fake.exchange_calls.fetch_add(1, Ordering::SeqCst);
            if form.get("code").map(String::as_str) != Some(GOOD_CODE) {
                return invalid_grant();
            }
            Json(json!({
                "access_token": "access-1",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "refresh-1",
                "scope": "user-read-private playlist-modify-public",
            }))
            .into_response()
        }
        Some("refresh_token") => {
            fake.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if fake.fail_refresh.load(Ordering::SeqCst) {
                return invalid_grant();
            }
            if fake.refresh_unavailable.load(Ordering::SeqCst) {
                return (StatusCode::SERVICE_UNAVAILABLE, "try again later").into_response();
            }
            let expires_in = if fake.refresh_expired.load(Ordering::SeqCst) {
                0
            } else {
                3600
            };
            // Spotify usually does not rotate the refresh token.
            Json(json!({
                "access_token": REFRESHED_ACCESS,
                "token_type": "Bearer",
                "expires_in": expires_in,
            }))
            .into_response()
        }
        _ => invalid_grant(),
    }
}

fn invalid_grant() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "invalid_grant"})),
    )
        .into_response()
}

fn has_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h.len() > "Bearer ".len() && h.starts_with("Bearer "))
}

async fn me(headers: HeaderMap) -> Response {
    if !has_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "id": SPOTIFY_USER,
        "display_name": "Test User",
        "email": "test@example.com",
        "country": "US",
        "followers": {"total": 7},
    }))
    .into_response()
}

async fn playlists(headers: HeaderMap) -> Response {
    if !has_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "items": [
            {"id": "pl-1", "name": "Road Trip", "tracks": {"total": 12}},
            {"id": "pl-2", "name": "Focus", "tracks": {"total": 0}},
        ],
        "next": null,
    }))
    .into_response()
}

/// Title inside the `track:"..."` term of a search query.
pub fn quoted_title(query: &str) -> Option<&str> {
    let start = query.find("track:\"")? + "track:\"".len();
    let rest = &query[start..];
    rest.find('"').map(|end| &rest[..end])
}

/// Search semantics: titles starting with "Missing" have no results,
/// titles starting with "Broken" make the search fail, titles starting with
/// "Slow" answer after two seconds, everything else matches `sp-<title>`.
async fn search(
    State(fake): State<Arc<FakeSpotify>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !has_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.search_calls.fetch_add(1, Ordering::SeqCst);

    let query = params.get("q").cloned().unwrap_or_default();
    let title = quoted_title(&query).unwrap_or_default();

    if title.starts_with("Slow") {
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    }

    if title.starts_with("Broken") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "search backend down").into_response();
    }

    let items: Vec<Value> = if title.starts_with("Missing") {
        vec![]
    } else {
        vec![json!({"id": format!("sp-{}", title.replace(' ', "-").to_lowercase()), "name": title})]
    };

    Json(json!({"tracks": {"items": items, "next": null}})).into_response()
}

async fn add_tracks(
    State(fake): State<Arc<FakeSpotify>>,
    Path(playlist_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let ids: Vec<String> = body["uris"]
        .as_array()
        .map(|uris| {
            uris.iter()
                .filter_map(|u| u.as_str())
                .map(|u| u.trim_start_matches("spotify:track:").to_string())
                .collect()
        })
        .unwrap_or_default();

    fake.add_calls
        .lock()
        .unwrap()
        .push((playlist_id.clone(), ids));

    if playlist_id == BROKEN_PLAYLIST {
        return (StatusCode::BAD_GATEWAY, "playlist unavailable").into_response();
    }

    (StatusCode::CREATED, Json(json!({"snapshot_id": "snap-1"}))).into_response()
}

async fn playlist_detail(Form(form): Form<HashMap<String, String>>) -> Response {
    let id: i64 = form.get("id").and_then(|v| v.parse().ok()).unwrap_or(0);

    match id {
        NETEASE_DENIED => Json(json!({"code": 401, "message": "no permission"})).into_response(),
        NETEASE_GARBAGE => "<html>not json</html>".into_response(),
        _ => Json(json!({
            "code": 200,
            "playlist": {
                "id": id,
                "name": "Fake Favorites",
                "trackCount": 3,
                "tracks": [
                    {"id": 1, "name": "Hello", "ar": [{"id": 1, "name": "Adele"}], "al": {"name": "25"}},
                    {"id": 2, "name": "Missing Song", "ar": [{"id": 2, "name": "Nobody"}, {"id": 3, "name": ""}], "al": {"name": ""}},
                    {"id": 3, "name": "Numb", "ar": [{"id": 4, "name": "Linkin Park"}, {"id": 5, "name": "Jay-Z"}]},
                ],
            },
        }))
        .into_response(),
    }
}

/// Router wired to fake upstreams, with handles for inspection.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub tokens: Arc<MemoryTokenStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub spotify: Arc<FakeSpotify>,
}

/// Config pointing at the given fake servers.
pub fn test_config(spotify: SocketAddr, netease: SocketAddr) -> Config {
    Config {
        spotify_accounts_url: format!("http://{}", spotify),
        spotify_api_url: format!("http://{}/v1", spotify),
        netease_api_url: format!("http://{}", netease),
        ..Config::test_default()
    }
}

/// Create a test app with fake Spotify and NetEase upstreams.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

/// Like [`create_test_app`], with a hook to adjust the config.
pub async fn create_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let (spotify_addr, spotify) = spawn_fake_spotify().await;
    let netease_addr = spawn_fake_netease().await;
    let mut config = test_config(spotify_addr, netease_addr);
    configure(&mut config);

    let tokens = Arc::new(MemoryTokenStore::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let state = Arc::new(
        AppState::new(config, tokens.clone(), sessions.clone())
            .expect("test config is valid"),
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        tokens,
        sessions,
        spotify,
    }
}

/// Identity headers that determine the session key.
pub const CLIENT_IP: &str = "203.0.113.10";
pub const USER_AGENT: &str = "playlist-bridge-tests/1.0";

/// Request builder carrying the default test client identity.
pub fn client_request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
        .header(header::USER_AGENT, USER_AGENT)
}

/// Session key the router derives for [`client_request`].
pub fn client_session_key() -> String {
    format!("{}_{}", CLIENT_IP, USER_AGENT)
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Location header of a redirect.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect has a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Extract the `state` query parameter from an authorization URL.
pub fn state_param(url: &str) -> String {
    url.split(['?', '&'])
        .find_map(|pair| pair.strip_prefix("state="))
        .expect("authorization URL has a state")
        .to_string()
}

/// Run login + callback for the default test client.
pub async fn login(app: &TestApp) -> Response {
    use tower::ServiceExt;

    let response = app
        .router
        .clone()
        .oneshot(
            client_request("GET", "/user/auth/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let state = state_param(&location(&response));

    app.router
        .clone()
        .oneshot(
            client_request(
                "GET",
                &format!("/user/auth/callback?code={}&state={}", GOOD_CODE, state),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap()
}
