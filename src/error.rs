//! Error taxonomy.
//!
//! Every error's `Display` is the line shown to the user, so the presentation
//! layer never has to rephrase a failure. Expected absences (no search hit, no
//! recommendations) are not errors; see [`crate::types::Resolution`] and
//! [`crate::types::Fetched`].

use thiserror::Error;

use crate::types::ApiErrorDetail;

/// Invalid or missing configuration. Fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot load environment: {0}")]
    Environment(String),
}

/// Failure to establish an authorized session. Fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Cannot start callback server on {addr}: {reason}")]
    CallbackServer { addr: String, reason: String },

    #[error("Authorization was denied: {0}")]
    Denied(String),

    #[error("The state returned by Spotify does not match the original state")]
    StateMismatch,

    #[error("Spotify did not return an authorization code")]
    MissingCode,

    #[error("Authentication failed or timed out")]
    TimedOut,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Failed to save token to cache: {0}")]
    Cache(String),

    #[error("Spotify authentication error: {0}")]
    Verification(#[from] FetchError),

    #[error("Error creating Spotify client: {0}")]
    Client(String),
}

/// Remote failure classified by the HTTP status Spotify answered with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Authentication failed. Please check your credentials or re-authenticate.")]
    Unauthorized,

    #[error(
        "Access denied. Please check your Spotify Developer Dashboard for API access requirements."
    )]
    Forbidden,

    #[error("API endpoint not found. Please check if the track exists.")]
    NotFoundEndpoint,

    #[error(
        "Spotify API error: http status: {status}, code:{} - {message}",
        .code.as_deref().unwrap_or("-1")
    )]
    Generic {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

impl ApiError {
    /// Maps a non-success status and the optional decoded error body.
    ///
    /// 401, 403 and 404 map to their own kinds regardless of the body; every
    /// other status keeps the status, reason code and message verbatim.
    pub fn from_status(status: u16, detail: Option<ApiErrorDetail>) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFoundEndpoint,
            _ => {
                let (code, message) = match detail {
                    Some(d) => (d.reason, d.message),
                    None => (None, String::new()),
                };
                ApiError::Generic {
                    status,
                    code,
                    message,
                }
            }
        }
    }
}

/// Any failure of a single catalog call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("An error occurred: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::transport(err)
    }
}

/// Operator typed something the loop cannot use; it re-prompts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter a valid number for recommendations.")]
    NotANumber,

    #[error("Please enter a number between {min} and {max}.")]
    OutOfRange { min: u8, max: u8 },

    #[error("Please enter a value.")]
    Empty,
}
