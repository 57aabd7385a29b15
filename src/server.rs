use std::{io, net::SocketAddr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
};

use crate::{
    api::{self, CallbackContext},
    types::PkceToken,
};

/// Binds the callback address. Done before the browser opens so a busy port
/// is reported instead of leaving the redirect with nowhere to go.
pub async fn bind(addr: SocketAddr) -> io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

pub fn router(state: Arc<Mutex<Option<PkceToken>>>, context: Arc<CallbackContext>) -> Router {
    Router::new()
        .route("/callback", get(api::callback))
        .layer(Extension(state))
        .layer(Extension(context))
        .route("/health", get(api::health))
}

/// Serves the callback routes until `shutdown` fires or its sender is dropped.
pub async fn serve(
    listener: TcpListener,
    state: Arc<Mutex<Option<PkceToken>>>,
    context: Arc<CallbackContext>,
    shutdown: oneshot::Receiver<()>,
) -> io::Result<()> {
    axum::serve(listener, router(state, context))
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
        })
        .await
}
