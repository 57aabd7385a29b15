//! Spotify Song Similarity Finder Library
//!
//! This library provides the building blocks of an interactive command-line
//! tool that authorizes against the Spotify Web API, resolves a track from a
//! title and an artist, asks Spotify for similar tracks seeded from it and
//! prints them as a table.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local OAuth callback server
//! - `cli` - Command implementations and the interactive session loop
//! - `config` - Configuration loading from the environment and `.env` files
//! - `console` - Marker-prefixed output lines
//! - `error` - Error taxonomy shared by every layer
//! - `management` - Token cache management
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client, track resolver and recommendation fetcher
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used where the concrete error does not matter to the caller, such as the
/// build-up of the binary's entry point.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Finding similar songs...");
/// info!("Authenticated as: {}", name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    println!("[{}] {}", $crate::console::Tone::Info.marker(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    println!("[{}] {}", $crate::console::Tone::Success.marker(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark.
///
/// Unlike a panic this never terminates the program; callers decide whether
/// the failure is fatal so the closing message is always printed.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    println!("[{}] {}", $crate::console::Tone::Error.marker(), std::format_args!($($arg)*));
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    println!("[{}] {}", $crate::console::Tone::Warning.marker(), std::format_args!($($arg)*));
  })
}
