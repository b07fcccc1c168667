// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (session gate, security headers, etc.).

pub mod auth;
pub mod security;
pub mod session;

pub use auth::{require_destination_auth, AuthedDestination};
pub use session::SessionKey;
