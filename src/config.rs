//! Configuration management for the Spotify Song Similarity Finder.
//!
//! This module handles loading and accessing configuration values from
//! environment variables and `.env` files. Credentials are never compiled in;
//! everything the session needs is resolved once into a [`Config`].
//!
//! The configuration system follows a hierarchical approach:
//! 1. Command-line flags (highest priority, applied by the binary)
//! 2. Environment variables
//! 3. `.env` file in the local data directory
//! 4. Application defaults (where applicable)

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use crate::{error::ConfigError, types::RecommendationConstraints};

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_SCOPE: &str = "user-read-private user-read-email";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_MARKET: &str = "US";
pub const DEFAULT_MIN_POPULARITY: u8 = 20;
pub const DEFAULT_MAX_POPULARITY: u8 = 100;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 120;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file lives under `songsim/.env` in the platform-specific local data
/// directory:
/// - Linux: `~/.local/share/songsim/.env`
/// - macOS: `~/Library/Application Support/songsim/.env`
/// - Windows: `%LOCALAPPDATA%/songsim/.env`
///
/// A missing file is fine; variables may come from the process environment
/// alone. Variables already set in the environment are not overridden.
pub async fn load_env() -> Result<(), ConfigError> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("songsim/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::Environment(e.to_string()))?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| ConfigError::Environment(e.to_string()))?;
    }
    Ok(())
}

/// Everything the OAuth flow and the token cache need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub show_dialog: bool,
}

/// Resolved runtime configuration.
///
/// Built once at startup by [`Config::from_env`]; command-line flags are
/// applied on top by the binary before any command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub oauth: OAuthSettings,
    pub server_addr: SocketAddr,
    pub api_url: String,
    pub token_cache: PathBuf,
    pub http_timeout: Duration,
    pub auth_timeout: Duration,
    pub constraints: RecommendationConstraints,
    pub debug: bool,
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Values are trimmed. An empty value counts as unset for every variable
    /// that has a default.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the raw value of a variable by name, or `None`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if:
    /// - `SPOTIFY_API_AUTH_CLIENT_ID` is missing or empty
    /// - `SERVER_ADDRESS` is not a socket address
    /// - a boolean, timeout or popularity variable cannot be parsed
    /// - the minimum popularity is above the maximum
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use songsim::config::Config;
    ///
    /// let vars = HashMap::from([("SPOTIFY_API_AUTH_CLIENT_ID", "my-client".to_string())]);
    /// let config = Config::from_lookup(|name| vars.get(name).cloned())?;
    /// assert_eq!(config.oauth.client_id, "my-client");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string());
        let or = |name: &str, default: &str| {
            get(name)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let client_id = get("SPOTIFY_API_AUTH_CLIENT_ID")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("SPOTIFY_API_AUTH_CLIENT_ID"))?;
        let client_secret = get("SPOTIFY_API_AUTH_CLIENT_SECRET").filter(|v| !v.is_empty());

        let server_raw = or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS);
        let server_addr = server_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "SERVER_ADDRESS",
                value: server_raw.clone(),
                reason: e.to_string(),
            })?;

        let oauth = OAuthSettings {
            client_id,
            client_secret,
            redirect_uri: or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            scope: or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
            auth_url: or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            show_dialog: parse_bool("SPOTIFY_API_SHOW_DIALOG", get("SPOTIFY_API_SHOW_DIALOG"), true)?,
        };

        let token_cache = get("SONGSIM_TOKEN_CACHE")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_token_cache);

        let http_timeout = parse_secs(
            "SONGSIM_HTTP_TIMEOUT_SECS",
            get("SONGSIM_HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        let auth_timeout = parse_secs(
            "SONGSIM_AUTH_TIMEOUT_SECS",
            get("SONGSIM_AUTH_TIMEOUT_SECS"),
            DEFAULT_AUTH_TIMEOUT_SECS,
        )?;

        let market = match get("SONGSIM_MARKET") {
            None => Some(DEFAULT_MARKET.to_string()),
            Some(v) if is_disabled(&v) => None,
            Some(v) => Some(v.to_uppercase()),
        };
        let min_popularity = parse_popularity(
            "SONGSIM_MIN_POPULARITY",
            get("SONGSIM_MIN_POPULARITY"),
            DEFAULT_MIN_POPULARITY,
        )?;
        let max_popularity = parse_popularity(
            "SONGSIM_MAX_POPULARITY",
            get("SONGSIM_MAX_POPULARITY"),
            DEFAULT_MAX_POPULARITY,
        )?;
        if let (Some(min), Some(max)) = (min_popularity, max_popularity) {
            if min > max {
                return Err(ConfigError::Invalid {
                    name: "SONGSIM_MIN_POPULARITY",
                    value: min.to_string(),
                    reason: format!("greater than SONGSIM_MAX_POPULARITY ({max})"),
                });
            }
        }

        Ok(Config {
            oauth,
            server_addr,
            api_url: or("SPOTIFY_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            token_cache,
            http_timeout,
            auth_timeout,
            constraints: RecommendationConstraints {
                market,
                min_popularity,
                max_popularity,
            },
            debug: parse_bool("SONGSIM_DEBUG", get("SONGSIM_DEBUG"), false)?,
        })
    }
}

/// Default location of the token cache:
/// `<data_local_dir>/songsim/cache/token.json`.
pub fn default_token_cache() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("songsim/cache/token.json");
    path
}

fn is_disabled(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

fn parse_bool(name: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected a boolean".into(),
        }),
    }
}

fn parse_secs(name: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(Duration::from_secs(default));
    };
    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            value,
            reason: "must be greater than zero".into(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}

fn parse_popularity(
    name: &'static str,
    value: Option<String>,
    default: u8,
) -> Result<Option<u8>, ConfigError> {
    let Some(value) = value else {
        return Ok(Some(default));
    };
    if is_disabled(&value) {
        return Ok(None);
    }
    match value.parse::<u8>() {
        Ok(p) if p <= 100 => Ok(Some(p)),
        Ok(_) => Err(ConfigError::Invalid {
            name,
            value,
            reason: "must be between 0 and 100".into(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}
