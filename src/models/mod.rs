// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod credential;
pub mod session;
pub mod track;
pub mod transfer;

pub use credential::Credential;
pub use session::AuthSession;
pub use track::{PlaylistSnapshot, Track};
pub use transfer::{FailedTrack, FailureKind, TransferResult};
