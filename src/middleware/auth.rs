// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication gate for Spotify-backed routes.

use crate::error::AppError;
use crate::middleware::session::SessionKey;
use crate::services::SpotifyClient;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated Spotify access for the current request.
#[derive(Debug, Clone)]
pub struct AuthedDestination {
    pub client: SpotifyClient,
    pub user_id: String,
}

/// Resolve the session into a usable Spotify client.
///
/// Credential problems that need a new login are reported as
/// `AuthenticationFailed`; storage and upstream outages pass through
/// unchanged.
///
/// Re-validated from the stores on every call; nothing is cached between
/// requests.
pub async fn authorize(state: &AppState, key: &SessionKey) -> Result<AuthedDestination, AppError> {
    let session = state
        .sessions
        .get(key.as_str())
        .await?
        .ok_or(AppError::Unauthenticated)?;

    let user_id = session
        .authed_user()
        .ok_or(AppError::Unauthenticated)?
        .to_string();

    let client = state
        .oauth
        .authenticated_client(&user_id)
        .await
        .map_err(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to get Spotify client");
            if e.is_auth_error() {
                AppError::AuthenticationFailed(e.to_string())
            } else {
                e
            }
        })?;

    Ok(AuthedDestination { client, user_id })
}

/// Middleware that requires an authenticated session with a usable credential.
pub async fn require_destination_auth(
    State(state): State<Arc<AppState>>,
    key: SessionKey,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authed = authorize(&state, &key).await?;
    request.extensions_mut().insert(authed);

    Ok(next.run(request).await)
}
