//! HTTP Server
//!
//! Binds the listen address and serves the router until Ctrl+C.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::store::Store;

use super::handlers;

/// Build the application router over a shared store
///
/// Request bodies larger than `max_value_size` are rejected with 413
/// before they reach the store.
pub fn build_router(store: Arc<Store>, max_value_size: usize) -> Router {
    Router::new()
        .route("/", get(handlers::hello))
        .route(
            "/key/:key",
            get(handlers::get_key)
                .post(handlers::set_key)
                .delete(handlers::delete_key),
        )
        .layer(DefaultBodyLimit::max(max_value_size))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// HTTP server for flatkv
pub struct Server {
    config: Config,
    store: Arc<Store>,
}

impl Server {
    /// Create a new server with the given config and store
    pub fn new(config: Config, store: Arc<Store>) -> Self {
        Self { config, store }
    }

    /// The router this server would serve
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.store), self.config.max_value_size)
    }

    /// Start the server, returning once a shutdown signal arrives
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Listening on http://{}", listener.local_addr()?);
        if !self.store.is_serialized() {
            tracing::warn!("Store operations are not serialized; concurrent writes may be lost");
        }

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, initiating shutdown..."),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
