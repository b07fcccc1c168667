// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify OAuth coordination: authorization URL, code exchange, refresh,
//! and authenticated client acquisition.

use crate::config::{Config, ConfigError};
use crate::error::AppError;
use crate::models::Credential;
use crate::services::spotify::SpotifyClient;
use crate::store::TokenStore;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::sync::Arc;

/// Scopes requested from Spotify.
pub const SCOPES: &[&str] = &[
    "user-read-private",
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
];

/// Bytes of randomness in an OAuth `state` value.
const STATE_BYTES: usize = 32;

/// Generate a random, URL-safe OAuth `state` value.
pub fn generate_state() -> Result<String, AppError> {
    let mut bytes = [0u8; STATE_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG unavailable")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Drives the Spotify authorization-code flow and owns token lifecycle.
///
/// Credentials live in the shared [`TokenStore`]. Access tokens are
/// refreshed lazily: only when a caller asks for a client and the stored
/// token has already expired.
#[derive(Clone)]
pub struct OAuthCoordinator {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    accounts_url: String,
    api_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl OAuthCoordinator {
    /// Build the coordinator, rejecting unusable client settings.
    pub fn new(
        config: &Config,
        http: reqwest::Client,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            http,
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            redirect_url: config.spotify_redirect_url.clone(),
            accounts_url: config.spotify_accounts_url.trim_end_matches('/').to_string(),
            api_url: config.spotify_api_url.clone(),
            tokens,
        })
    }

    /// The token store this coordinator persists credentials into.
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Authorization URL the user is redirected to. Pure function of `state`.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?\
             client_id={}&\
             response_type=code&\
             redirect_uri={}&\
             scope={}&\
             state={}",
            self.accounts_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode(&SCOPES.join(" ")),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for a credential.
    ///
    /// `state` must already have been validated against the session by the
    /// caller. The returned credential is not yet bound to a user.
    pub async fn exchange_code(&self, code: &str, _state: &str) -> Result<Credential, AppError> {
        let response = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .await
            .map_err(|e| AppError::Exchange(format!("Token request failed: {}", e)))?;

        let token = parse_token_response(response, AppError::Exchange).await?;

        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            AppError::Exchange("Token response did not include a refresh token".to_string())
        })?;

        Ok(token.into_credential(refresh_token))
    }

    /// Exchange a refresh token for a fresh credential.
    ///
    /// If Spotify does not rotate the refresh token, the old one is kept.
    /// A rejected refresh token fails with `Refresh`; an unreachable or
    /// failing token endpoint fails with `Upstream` so callers can keep the
    /// session and retry.
    pub async fn refresh_credential(&self, refresh_token: &str) -> Result<Credential, AppError> {
        if refresh_token.is_empty() {
            return Err(AppError::Refresh("No refresh token available".to_string()));
        }

        let response = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await
            .map_err(|e| AppError::Upstream(format!("Token request failed: {}", e)))?;

        let token = parse_token_response(response, AppError::Refresh).await?;

        let refresh_token = token
            .refresh_token
            .clone()
            .unwrap_or_else(|| refresh_token.to_string());

        Ok(token.into_credential(refresh_token))
    }

    /// Get a Spotify client for `user_id`, refreshing an expired token first.
    ///
    /// Performs at most one refresh per call. The refreshed credential is
    /// persisted under the same user ID before the client is returned.
    pub async fn authenticated_client(&self, user_id: &str) -> Result<SpotifyClient, AppError> {
        let credential = self
            .tokens
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::CredentialNotFound(user_id.to_string()))?;

        let credential = if credential.is_valid() {
            credential
        } else {
            tracing::info!(user_id, "Access token expired, refreshing");

            let mut refreshed = self.refresh_credential(&credential.refresh_token).await?;
            refreshed.user_id = user_id.to_string();
            self.tokens.put(user_id, refreshed.clone()).await?;

            tracing::info!(user_id, expires_at = %refreshed.expires_at, "Token refreshed and stored");
            refreshed
        };

        Ok(self.client_for(credential.access_token))
    }

    /// Build a client for a raw access token (used right after exchange,
    /// before the credential is bound to a user).
    pub fn client_for(&self, access_token: String) -> SpotifyClient {
        SpotifyClient::new(self.http.clone(), &self.api_url, access_token)
    }

    /// Forget the stored credential for `user_id`.
    pub async fn revoke_credential(&self, user_id: &str) -> Result<(), AppError> {
        self.tokens.delete(user_id).await?;
        tracing::info!(user_id, "Credential revoked");
        Ok(())
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    fn into_credential(self, refresh_token: String) -> Credential {
        let scopes = match self.scope.as_deref() {
            Some(scope) if !scope.trim().is_empty() => {
                scope.split_whitespace().map(String::from).collect()
            }
            _ => SCOPES.iter().map(|s| s.to_string()).collect(),
        };

        Credential {
            user_id: String::new(),
            access_token: self.access_token,
            refresh_token,
            token_type: self.token_type,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            scopes,
        }
    }
}

/// Check the token endpoint response.
///
/// Server errors map to `Upstream`. Rejections, unparseable bodies and
/// tokens that are already expired map through `rejected`.
async fn parse_token_response(
    response: reqwest::Response,
    rejected: fn(String) -> AppError,
) -> Result<TokenResponse, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "Spotify token endpoint rejected request");
        let message = format!("HTTP {}: {}", status, body);
        return Err(if status.is_server_error() {
            AppError::Upstream(message)
        } else {
            rejected(message)
        });
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| rejected(format!("Failed to parse token response: {}", e)))?;

    check_lifetime(token).map_err(rejected)
}

/// Reject tokens that would already be expired when stored.
fn check_lifetime(token: TokenResponse) -> Result<TokenResponse, String> {
    if token.expires_in <= 0 {
        return Err(format!(
            "Token response has non-positive expires_in: {}",
            token.expires_in
        ));
    }
    Ok(token)
}
