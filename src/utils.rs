use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::error::InputError;

pub const MIN_RECOMMENDATIONS: u8 = 1;
pub const MAX_RECOMMENDATIONS: u8 = 10;

/// Generates a PKCE code verifier of 128 alphanumeric characters.
pub fn generate_code_verifier() -> String {
    random_alphanumeric(128)
}

pub fn generate_state() -> String {
    random_alphanumeric(32)
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Derives the S256 code challenge for a verifier.
///
/// # Arguments
///
/// * `verifier` - The code verifier sent later with the token exchange
///
/// # Example
///
/// ```
/// let challenge = generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
/// assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
/// ```
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Combined field-filtered search string, e.g. `track:Yesterday artist:The Beatles`.
pub fn build_search_query(title: &str, artist: &str) -> String {
    format!("track:{} artist:{}", title.trim(), artist.trim())
}

/// Parses the requested number of recommendations, accepting only 1 to 10.
pub fn parse_count(input: &str) -> Result<u8, InputError> {
    let value: i64 = input.trim().parse().map_err(|_| InputError::NotANumber)?;
    if !(MIN_RECOMMENDATIONS as i64..=MAX_RECOMMENDATIONS as i64).contains(&value) {
        return Err(InputError::OutOfRange {
            min: MIN_RECOMMENDATIONS,
            max: MAX_RECOMMENDATIONS,
        });
    }
    Ok(value as u8)
}

/// Only an explicit yes keeps the session going.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Starts a steadily ticking spinner on stderr. Call `finish_and_clear` when done.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
