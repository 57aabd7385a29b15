//! # API Module
//!
//! HTTP handlers served by the local callback server while the browser-based
//! authorization runs.
//!
//! - [`callback`] - receives Spotify's redirect, checks the `state` value and
//!   exchanges the authorization code for a token using the PKCE verifier.
//!   Any rejected callback is recorded so the waiting side fails
//!   immediately instead of running into the timeout.
//! - [`health`] - reports the application name and version.

mod callback;
mod health;

pub use callback::{CallbackContext, callback};
pub use health::health;
