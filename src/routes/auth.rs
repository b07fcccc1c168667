// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify OAuth authentication routes.

use super::RouteHandler;
use crate::error::{AppError, Result};
use crate::middleware::session::{session_cookie, session_cookie_removal, SessionKey};
use crate::models::AuthSession;
use crate::services::oauth::generate_state;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Login, callback, status and logout routes.
pub struct UserAuthRoutes;

impl RouteHandler for UserAuthRoutes {
    fn register(
        &self,
        router: Router<Arc<AppState>>,
        _state: &Arc<AppState>,
    ) -> Router<Arc<AppState>> {
        router
            .route("/user/auth/login", get(login))
            .route("/user/auth/callback", get(callback))
            .route("/user/auth/status", post(status))
            .route("/user/auth/logout", post(logout))
    }
}

/// 302 redirect.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Frontend landing URL for a failed login.
fn error_landing(frontend_url: &str, error: &str) -> String {
    format!(
        "{}?auth=error&error={}",
        frontend_url,
        urlencoding::encode(error)
    )
}

/// Start OAuth flow - record a CSRF challenge and redirect to Spotify.
async fn login(State(state): State<Arc<AppState>>, key: SessionKey) -> Response {
    let challenge = match issue_challenge(&state, &key).await {
        Ok(challenge) => challenge,
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue OAuth state");
            return found(&error_landing(&state.config.frontend_url, "failed_to_set_state"));
        }
    };

    tracing::info!(
        client_id = %state.config.spotify_client_id,
        "Starting OAuth flow, redirecting to Spotify"
    );

    found(&state.oauth.authorization_url(&challenge))
}

async fn issue_challenge(state: &AppState, key: &SessionKey) -> Result<String> {
    let challenge = generate_state()?;
    state
        .sessions
        .set_challenge(key.as_str(), &challenge)
        .await?;
    Ok(challenge)
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code, establish the session.
async fn callback(
    State(state): State<Arc<AppState>>,
    key: SessionKey,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let frontend_url = state.config.frontend_url.as_str();

    // Check for OAuth errors
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        tracing::warn!(error = %error, "OAuth error from Spotify");
        return found(&error_landing(frontend_url, &error));
    }

    let (Some(code), Some(oauth_state)) = (
        params.code.filter(|c| !c.is_empty()),
        params.state.filter(|s| !s.is_empty()),
    ) else {
        return found(&error_landing(frontend_url, "missing_parameters"));
    };

    if !state
        .sessions
        .validate_challenge(key.as_str(), &oauth_state)
        .await
    {
        tracing::warn!("OAuth state did not match the session challenge");
        return found(&error_landing(frontend_url, "invalid_state"));
    }

    match complete_login(&state, &key, &code, &oauth_state).await {
        Ok(user_id) => {
            tracing::info!(user_id = %user_id, "OAuth successful, session established");
            let redirect = format!(
                "{}?auth=success&user={}",
                frontend_url,
                urlencoding::encode(&user_id)
            );
            (jar.add(session_cookie()), found(&redirect)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "OAuth callback failed");
            found(&error_landing(frontend_url, e.code()))
        }
    }
}

/// Exchange the code, bind the credential to the Spotify user, and mark the
/// session authenticated. Returns the Spotify user ID.
async fn complete_login(
    state: &AppState,
    key: &SessionKey,
    code: &str,
    oauth_state: &str,
) -> Result<String> {
    tracing::info!("Exchanging authorization code for tokens");
    let mut credential = state.oauth.exchange_code(code, oauth_state).await?;

    let user = state
        .oauth
        .client_for(credential.access_token.clone())
        .current_user()
        .await?;

    if user.id.is_empty() {
        return Err(AppError::AuthenticationFailed(
            "Spotify returned an empty user ID".to_string(),
        ));
    }

    credential.user_id = user.id.clone();
    state
        .oauth
        .token_store()
        .put(&user.id, credential)
        .await?;

    state
        .sessions
        .set(key.as_str(), AuthSession::authenticated(&user.id, Utc::now()))
        .await?;

    Ok(user.id)
}

/// Authentication status response.
#[derive(Serialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<DateTime<Utc>>,
    pub message: String,
}

impl StatusResponse {
    fn unauthenticated(message: &str) -> Self {
        Self {
            authenticated: false,
            user_id: None,
            auth_time: None,
            message: message.to_string(),
        }
    }
}

/// Report whether this session is authenticated, refreshing a stale token.
/// A session whose token is rejected by Spotify is deleted. Outages while
/// refreshing are returned as errors and leave the session in place.
async fn status(
    State(state): State<Arc<AppState>>,
    key: SessionKey,
    jar: CookieJar,
) -> Result<(CookieJar, Json<StatusResponse>)> {
    let session = state.sessions.get(key.as_str()).await?;
    let Some(session) = session.filter(|s| s.authed_user().is_some()) else {
        return Ok((
            jar,
            Json(StatusResponse::unauthenticated("user is not authorized")),
        ));
    };

    let tokens = state.oauth.token_store();
    let usable = if tokens.is_valid(&session.user_id).await {
        true
    } else {
        match state.oauth.authenticated_client(&session.user_id).await {
            Ok(_) => true,
            Err(e) if e.is_auth_error() => {
                tracing::info!(user_id = %session.user_id, error = %e, "Token could not be refreshed");
                false
            }
            Err(e) => {
                tracing::warn!(user_id = %session.user_id, error = %e, "Token refresh unavailable");
                return Err(e);
            }
        }
    };

    if !usable {
        state.sessions.delete(key.as_str()).await?;
        return Ok((
            jar.add(session_cookie_removal()),
            Json(StatusResponse::unauthenticated(
                "token expired and could not be refreshed",
            )),
        ));
    }

    Ok((
        jar,
        Json(StatusResponse {
            authenticated: true,
            user_id: Some(session.destination_user_id.clone()),
            auth_time: session.auth_time,
            message: "user is authorized".to_string(),
        }),
    ))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Logout - revoke the stored credential and drop the session.
async fn logout(
    State(state): State<Arc<AppState>>,
    key: SessionKey,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>)> {
    if let Some(session) = state.sessions.get(key.as_str()).await? {
        if let Some(user_id) = session.authed_user() {
            state.oauth.revoke_credential(user_id).await?;
        }
        state.sessions.delete(key.as_str()).await?;
    }

    Ok((
        jar.add(session_cookie_removal()),
        Json(LogoutResponse {
            message: "logged out".to_string(),
        }),
    ))
}
