// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer for credentials and sessions.
//!
//! Both stores are capability traits so the in-memory backing can be
//! replaced (persistent, distributed) without touching OAuth or gate logic.
//! Backends report their own failures as [`AppError::Storage`]; the
//! in-memory stores never fail.
//!
//! [`AppError::Storage`]: crate::error::AppError::Storage

pub mod session;
pub mod token;

pub use session::{MemorySessionStore, SessionStore, CHALLENGE_TTL_MINUTES};
pub use token::{MemoryTokenStore, TokenStore};
