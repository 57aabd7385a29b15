use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
    config::OAuthSettings,
    error::{ApiError, FetchError},
    management::TokenManager,
    spotify::Catalog,
    types::{
        ApiErrorDetail, ApiErrorEnvelope, ApiTrack, CurrentUser, RecommendationRequest,
        RecommendationsResponse, SearchResponse,
    },
};

/// Builds the HTTP client shared by every request of a session.
pub fn build_http(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// An authorized handle to the Spotify Web API.
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    oauth: OAuthSettings,
    tokens: TokenManager,
}

impl SpotifyClient {
    pub fn new(
        http: Client,
        api_url: impl Into<String>,
        oauth: OAuthSettings,
        tokens: TokenManager,
    ) -> Self {
        SpotifyClient {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            oauth,
            tokens,
        }
    }

    /// Profile of the user the session is authorized for.
    pub async fn current_user(&mut self) -> Result<CurrentUser, FetchError> {
        self.get("/me", &[]).await
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    async fn get<T: DeserializeOwned>(
        &mut self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let token = self.tokens.get_valid_token(&self.http, &self.oauth).await;
        let url = format!("{}{}", self.api_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        debug!("GET {} -> {}", url, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // A non-JSON body (e.g. a proxy page) still maps by status.
            let detail = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
                Ok(envelope) => envelope.error,
                Err(_) => {
                    debug!("Undecodable error body from {}: {:?}", url, body);
                    ApiErrorDetail {
                        status: status.as_u16(),
                        message: status.canonical_reason().unwrap_or("error").to_string(),
                        reason: None,
                    }
                }
            };
            return Err(ApiError::from_status(status.as_u16(), Some(detail)).into());
        }

        response.json::<T>().await.map_err(FetchError::transport)
    }
}

impl Catalog for SpotifyClient {
    async fn search_tracks(&mut self, query: &str, limit: u8) -> Result<Vec<ApiTrack>, FetchError> {
        let params = [
            ("q", query.to_string()),
            ("type", "track".to_string()),
            ("limit", limit.to_string()),
        ];
        let res: SearchResponse = self.get("/search", &params).await?;
        Ok(res.tracks.items)
    }

    async fn recommendations(
        &mut self,
        request: &RecommendationRequest,
    ) -> Result<Vec<ApiTrack>, FetchError> {
        let res: RecommendationsResponse =
            self.get("/recommendations", &request.query_pairs()).await?;
        Ok(res.tracks)
    }
}
