// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod netease;
pub mod oauth;
pub mod spotify;
pub mod transfer;

pub use netease::NeteaseService;
pub use oauth::OAuthCoordinator;
pub use spotify::SpotifyClient;
pub use transfer::{DestinationCatalog, TransferEngine};
