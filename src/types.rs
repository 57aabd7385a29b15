use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::AuthError;

/// Text shown in place of a missing preview link.
pub const PREVIEW_UNAVAILABLE: &str = "Not available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// Raw body of Spotify's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Outcome of the browser redirect, shared between the auth flow and the
/// callback handler.
#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub state: String,
    pub token: Option<Token>,
    pub failure: Option<AuthError>,
}

/// One operator request: a title, an artist and how many similar songs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub title: String,
    pub artist: String,
    pub count: u8,
}

/// The top search hit used to seed recommendations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub track_id: String,
    pub artist_id: String,
    pub name: String,
    pub artist_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResolvedTrack),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Tracks(Vec<Recommendation>),
    Empty,
}

/// A similar track as printed to the operator. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct Recommendation {
    pub name: String,
    pub artist: String,
    pub album: String,
    pub popularity: u32,
    pub preview_url: String,
    pub spotify_url: String,
}

impl From<ApiTrack> for Recommendation {
    fn from(track: ApiTrack) -> Self {
        let artist = track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();

        Recommendation {
            name: track.name,
            artist,
            album: track.album.map(|a| a.name).unwrap_or_default(),
            popularity: track.popularity.unwrap_or(0),
            preview_url: track
                .preview_url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| PREVIEW_UNAVAILABLE.to_string()),
            spotify_url: track.external_urls.spotify.unwrap_or_default(),
        }
    }
}

/// Optional filters applied to every recommendation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationConstraints {
    pub market: Option<String>,
    pub min_popularity: Option<u8>,
    pub max_popularity: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub seed_tracks: Vec<String>,
    pub seed_artists: Vec<String>,
    pub limit: u8,
    pub constraints: RecommendationConstraints,
}

impl RecommendationRequest {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("seed_tracks", self.seed_tracks.join(",")),
            ("seed_artists", self.seed_artists.join(",")),
            ("limit", self.limit.to_string()),
        ];
        if let Some(market) = &self.constraints.market {
            pairs.push(("market", market.clone()));
        }
        if let Some(min) = self.constraints.min_popularity {
            pairs.push(("min_popularity", min.to_string()));
        }
        if let Some(max) = self.constraints.max_popularity {
            pairs.push(("max_popularity", max.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub tracks: TracksPage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracksPage {
    pub items: Vec<ApiTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub tracks: Vec<ApiTrack>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    pub album: Option<ApiAlbum>,
    pub popularity: Option<u32>,
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiAlbum {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Spotify wraps every Web API error as `{"error": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reason: Option<String>,
}
