use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::debug;
use reqwest::{Client, Url};
use tokio::sync::{Mutex, oneshot};

use crate::{
    api::CallbackContext,
    config::{Config, OAuthSettings},
    error::AuthError,
    management::TokenManager,
    server,
    spotify::client::{SpotifyClient, build_http},
    types::{CurrentUser, PkceToken, Token, TokenResponse},
    utils, warning,
};

/// Establishes an authorized, verified session.
///
/// A cached token is reused (and refreshed when close to expiry) unless
/// `force_consent` is set or no usable cache exists, in which case the
/// browser-based PKCE flow runs and its token is persisted. Either way the
/// session is verified with a profile lookup before it is returned, so a
/// rejected or revoked token fails here rather than on the first search.
///
/// # Arguments
///
/// * `config` - Credentials, endpoints, cache path and timeouts
/// * `force_consent` - Ignore the cache and always ask for consent
///
/// # Errors
///
/// - [`AuthError::CallbackServer`] if the callback address cannot be bound
/// - [`AuthError::Denied`], [`AuthError::StateMismatch`],
///   [`AuthError::MissingCode`] or [`AuthError::TimedOut`] if consent fails
/// - [`AuthError::Cache`] if a new token cannot be saved
/// - [`AuthError::Verification`] if Spotify rejects the profile lookup
///
/// # Example
///
/// ```
/// let (mut client, user) = establish_session(&config, false).await?;
/// println!("Authenticated as: {}", user.id);
/// ```
pub async fn establish_session(
    config: &Config,
    force_consent: bool,
) -> Result<(SpotifyClient, CurrentUser), AuthError> {
    let http = build_http(config.http_timeout).map_err(|e| AuthError::Client(e.to_string()))?;

    let cached = if force_consent {
        None
    } else {
        match TokenManager::load(&config.token_cache).await {
            Ok(mgr) => Some(mgr),
            Err(e) => {
                debug!(
                    "No usable token cache at {}: {}",
                    config.token_cache.display(),
                    e
                );
                None
            }
        }
    };

    let tokens = match cached {
        Some(mgr) => mgr,
        None => {
            let token = authorize(config, &http).await?;
            let mgr = TokenManager::new(token, &config.token_cache);
            mgr.persist().await.map_err(AuthError::Cache)?;
            mgr
        }
    };

    let mut client = SpotifyClient::new(http, &config.api_url, config.oauth.clone(), tokens);
    let user = client.current_user().await?;
    Ok((client, user))
}

/// Runs the complete OAuth 2.0 PKCE flow and returns the obtained token.
///
/// 1. Generates the code verifier, its S256 challenge and a `state` value
/// 2. Binds the local callback server (failing early if the port is taken)
/// 3. Opens the authorization URL in the default browser
/// 4. Waits for the callback handler to exchange the code
/// 5. Shuts the callback server down
pub async fn authorize(config: &Config, http: &Client) -> Result<Token, AuthError> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let state = utils::generate_state();

    let auth_url =
        authorize_url(&config.oauth, &code_challenge, &state).map_err(AuthError::Client)?;

    let shared_state: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(Some(PkceToken {
        code_verifier,
        state,
        token: None,
        failure: None,
    })));

    let listener = server::bind(config.server_addr)
        .await
        .map_err(|e| AuthError::CallbackServer {
            addr: config.server_addr.to_string(),
            reason: e.to_string(),
        })?;

    let context = Arc::new(CallbackContext {
        oauth: config.oauth.clone(),
        http: http.clone(),
    });
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server_state = Arc::clone(&shared_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, server_state, context, shutdown_rx).await {
            debug!("Callback server stopped with error: {}", e);
        }
    });

    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let pb = utils::spinner("Waiting for authorization in the browser...");
    let result = wait_for_token(Arc::clone(&shared_state), config.auth_timeout).await;
    pb.finish_and_clear();

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    result
}

/// Authorization URL with every parameter properly encoded.
pub fn authorize_url(
    oauth: &OAuthSettings,
    code_challenge: &str,
    state: &str,
) -> Result<Url, String> {
    let mut params = vec![
        ("client_id", oauth.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", oauth.redirect_uri.as_str()),
        ("code_challenge_method", "S256"),
        ("code_challenge", code_challenge),
        ("state", state),
        ("scope", oauth.scope.as_str()),
    ];
    if oauth.show_dialog {
        params.push(("show_dialog", "true"));
    }
    Url::parse_with_params(&oauth.auth_url, &params).map_err(|e| e.to_string())
}

/// Polls the shared state until the callback handler stores a token or a
/// failure, or until `max_wait` elapses.
pub async fn wait_for_token(
    shared_state: Arc<Mutex<Option<PkceToken>>>,
    max_wait: Duration,
) -> Result<Token, AuthError> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(pkce_token) = lock.as_ref() {
            if let Some(failure) = &pkce_token.failure {
                return Err(failure.clone());
            }
            if let Some(token) = &pkce_token.token {
                return Ok(token.clone());
            }
        }
        drop(lock);
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    Err(AuthError::TimedOut)
}

/// Exchanges an authorization code for a token using the PKCE verifier.
pub async fn exchange_code_pkce(
    http: &Client,
    oauth: &OAuthSettings,
    code: &str,
    verifier: &str,
) -> Result<Token, String> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("client_id", oauth.client_id.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("redirect_uri", oauth.redirect_uri.as_str()),
    ];
    if let Some(secret) = &oauth.client_secret {
        form.push(("client_secret", secret.as_str()));
    }

    let res = request_token(http, &oauth.token_url, &form).await?;
    let refresh_token = res.refresh_token.clone().unwrap_or_default();
    Ok(into_token(res, refresh_token))
}

/// Trades a refresh token for a new access token.
///
/// Spotify may omit the refresh token from the response; the current one
/// stays valid in that case and is carried over.
pub async fn refresh_token(
    http: &Client,
    oauth: &OAuthSettings,
    refresh_token: &str,
) -> Result<Token, String> {
    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", oauth.client_id.as_str()),
    ];
    if let Some(secret) = &oauth.client_secret {
        form.push(("client_secret", secret.as_str()));
    }

    let res = request_token(http, &oauth.token_url, &form).await?;
    let next_refresh = res
        .refresh_token
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| refresh_token.to_string());
    Ok(into_token(res, next_refresh))
}

async fn request_token(
    http: &Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, String> {
    let res = http
        .post(token_url)
        .form(form)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(format!("{} {}", status, body));
    }

    res.json::<TokenResponse>().await.map_err(|e| e.to_string())
}

fn into_token(res: TokenResponse, refresh_token: String) -> Token {
    Token {
        access_token: res.access_token,
        refresh_token,
        scope: res.scope.unwrap_or_default(),
        expires_in: res.expires_in,
        obtained_at: Utc::now().timestamp() as u64,
    }
}
