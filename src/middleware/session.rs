// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session key extraction and the session marker cookie.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Name of the marker cookie set once a session is authenticated.
pub const SESSION_COOKIE: &str = "session_id";

/// Lifetime of the marker cookie.
const SESSION_COOKIE_MAX_AGE_SECS: i64 = 3600;

/// Server-side session key: `"{client_ip}_{user_agent}"`.
///
/// Coarse by construction. Clients behind the same address with the same
/// User-Agent share a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(client_ip: &str, user_agent: &str) -> Self {
        Self(format!("{}_{}", client_ip, user_agent))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the key from request metadata.
    ///
    /// Client IP is the first `X-Forwarded-For` hop, then the socket peer,
    /// then `unknown`.
    pub fn from_parts(parts: &Parts) -> Self {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(String::from);

        let client_ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        Self::new(&client_ip, user_agent)
    }
}

impl<S> FromRequestParts<S> for SessionKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Marker cookie announcing an authenticated session. Carries no credentials.
pub fn session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "authenticated"))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(SESSION_COOKIE_MAX_AGE_SECS))
        .build()
}

/// Cookie that clears [`session_cookie`] on the client.
pub fn session_cookie_removal() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}
