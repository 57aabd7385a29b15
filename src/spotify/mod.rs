//! # Spotify Integration Module
//!
//! The integration layer between the session loop and the Spotify Web API.
//!
//! ```text
//! Session Loop (cli)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (OAuth 2.0 PKCE, token cache, profile check)
//!     ├── Track Resolver (search, top hit)
//!     └── Recommendation Fetcher (seeded recommendations)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! The resolver and the fetcher only talk to the [`Catalog`] trait, so the
//! session loop can run against [`client::SpotifyClient`] in production and
//! against an in-memory catalog in tests.
//!
//! ## API Coverage
//!
//! - `GET /me` - profile lookup used to verify a fresh session
//! - `GET /search` - track search with `track:` and `artist:` field filters
//! - `GET /recommendations` - tracks similar to the given seeds
//! - `POST /api/token` - code exchange and token refresh

use std::future::Future;

use crate::{
    error::FetchError,
    types::{ApiTrack, RecommendationRequest},
};

pub mod auth;
pub mod client;
pub mod recommendations;
pub mod search;

/// The two remote calls a recommendation round needs.
pub trait Catalog {
    /// Runs a track search and returns at most `limit` items in service order.
    fn search_tracks(
        &mut self,
        query: &str,
        limit: u8,
    ) -> impl Future<Output = Result<Vec<ApiTrack>, FetchError>>;

    /// Requests tracks similar to the request's seeds, in service order.
    fn recommendations(
        &mut self,
        request: &RecommendationRequest,
    ) -> impl Future<Output = Result<Vec<ApiTrack>, FetchError>>;
}
