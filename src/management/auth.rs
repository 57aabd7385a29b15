use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, warn};
use reqwest::Client;

use crate::{config::OAuthSettings, spotify, types::Token};

/// Seconds before expiry at which a token is already treated as expired.
const EXPIRY_MARGIN_SECS: u64 = 240;

/// Owns the current token and the JSON cache file it is persisted to.
pub struct TokenManager {
    token: Token,
    path: PathBuf,
}

impl TokenManager {
    pub fn new(token: Token, path: impl Into<PathBuf>) -> Self {
        TokenManager {
            token,
            path: path.into(),
        }
    }

    /// Reads a cached token from `path`.
    ///
    /// # Errors
    ///
    /// Returns the reason as a string if the file cannot be read or does not
    /// hold a token. Callers treat both cases as "no cache".
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token, path })
    }

    /// Writes the token as pretty JSON, creating parent directories first.
    pub async fn persist(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Removes the cache file. A file that is already gone is not an error.
    pub async fn clear(path: &Path) -> Result<(), String> {
        match async_fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Returns an access token, refreshing and re-persisting it first when it
    /// is about to expire. A failed refresh keeps the old token; the next API
    /// call then reports the rejection.
    pub async fn get_valid_token(&mut self, http: &Client, oauth: &OAuthSettings) -> String {
        if self.is_expired() {
            debug!("Access token expired, attempting to refresh");
            match spotify::auth::refresh_token(http, oauth, &self.token.refresh_token).await {
                Ok(new_token) => {
                    self.token = new_token;
                    if let Err(e) = self.persist().await {
                        warn!("Failed to save refreshed token: {}", e);
                    }
                }
                Err(e) => warn!("Token refresh failed: {}", e),
            }
        }

        self.token.access_token.clone()
    }

    /// Whether the token expires within the next 240 seconds.
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        let expires_at = self.token.obtained_at.saturating_add(self.token.expires_in);
        now >= expires_at.saturating_sub(EXPIRY_MARGIN_SECS)
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
