use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::{
    config::OAuthSettings, error::AuthError, spotify::auth::exchange_code_pkce, types::PkceToken,
    warning,
};

/// What the callback handler needs to finish the code exchange.
pub struct CallbackContext {
    pub oauth: OAuthSettings,
    pub http: Client,
}

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<PkceToken>>>>,
    Extension(context): Extension<Arc<CallbackContext>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;
    let Some(pkce_state) = state.as_mut() else {
        return Html("<h4>Missing PKCE code verifier.</h4>");
    };

    if let Some(reason) = params.get("error") {
        pkce_state.failure = Some(AuthError::Denied(reason.clone()));
        return Html("<h4>Authorization denied.</h4><p>Close browser window.</p>");
    }

    if params.get("state") != Some(&pkce_state.state) {
        pkce_state.failure = Some(AuthError::StateMismatch);
        return Html("<h4>State mismatch.</h4>");
    }

    let Some(code) = params.get("code") else {
        pkce_state.failure = Some(AuthError::MissingCode);
        return Html("<h4>Missing authorization code.</h4>");
    };

    let verifier = pkce_state.code_verifier.clone();
    match exchange_code_pkce(&context.http, &context.oauth, code, &verifier).await {
        Ok(token) => {
            pkce_state.token = Some(token);
            Html("<h2>Authentication successful.</h2><p>Close browser window.</p>")
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            pkce_state.failure = Some(AuthError::TokenExchange(e));
            Html("<h4>Login failed.</h4>")
        }
    }
}
