//! # CLI Module
//!
//! The user-facing layer of the Spotify Song Similarity Finder. It turns the
//! authorized Spotify client into an interactive session and formats every
//! outcome for the console.
//!
//! ## Commands
//!
//! - [`run`] - authenticates (reusing the token cache when possible) and
//!   enters the interactive [`Session`] loop
//! - [`auth`] - forces a fresh consent flow and caches the token
//! - [`logout`] - deletes the cached token
//!
//! ## Session flow
//!
//! ```text
//! Start → Authenticating → Ready → AwaitingQuery → Resolving → Recommending
//!                                       ↑              │             │
//!                                       └── NotFound ──┘             ↓
//!                                       └──── yes ──── Confirming ← Presenting
//!                                                          │
//!                                                          no → Exit
//! ```
//!
//! Only a failure while authenticating is fatal. Search and recommendation
//! failures are printed and the loop carries on; invalid input re-prompts.

mod auth;
pub mod presenter;
mod session;

use std::io;

pub use auth::{auth, logout};
pub use session::Session;

use crate::{config::Config, error::AuthError, info, spotify, success, warning};

/// Authenticates and runs the interactive loop on stdin and stdout.
pub async fn run(config: &Config) -> Result<(), AuthError> {
    let (mut client, user) = spotify::auth::establish_session(config, false).await?;
    success!("Successfully connected to Spotify!");
    info!(
        "Authenticated as: {}",
        user.display_name.as_deref().unwrap_or(&user.id)
    );

    let stdin = io::stdin();
    let session = Session::new(&mut client, stdin.lock(), io::stdout())
        .constraints(config.constraints.clone())
        .debug(config.debug)
        .progress(true);

    if let Err(e) = session.run().await {
        warning!("Console closed unexpectedly: {}", e);
    }
    Ok(())
}
