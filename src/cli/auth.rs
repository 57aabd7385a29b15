use crate::{config::Config, error::AuthError, management::TokenManager, spotify, success};

/// Forces a fresh consent flow and caches the resulting token.
pub async fn auth(config: &Config) -> Result<(), AuthError> {
    let (_, user) = spotify::auth::establish_session(config, true).await?;
    success!(
        "Authentication successful! Logged in as {}",
        user.display_name.as_deref().unwrap_or(&user.id)
    );
    Ok(())
}

/// Deletes the cached token so the next run asks for consent again.
pub async fn logout(config: &Config) -> Result<(), AuthError> {
    TokenManager::clear(&config.token_cache)
        .await
        .map_err(AuthError::Cache)?;
    success!("Removed cached token at {}", config.token_cache.display());
    Ok(())
}
