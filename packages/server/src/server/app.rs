//! Application setup and server configuration.

use std::future::IntoFuture;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::kernel::{Service, ServerDeps};
use crate::server::routes::{create_review_handler, get_review_handler, health_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps) -> Router {
    let app_state = AppState { deps };

    Router::new()
        .route("/api/reviews", post(create_review_handler))
        .route("/api/reviews/:id", get(get_review_handler))
        .route("/health", get(health_handler))
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
}

/// HTTP listener run as a hosted service.
///
/// On shutdown the listener stops accepting connections and in-flight
/// requests get `grace_period` to finish before the server is dropped.
pub struct HttpServer {
    addr: String,
    router: Router,
    grace_period: Duration,
}

impl HttpServer {
    pub fn new(addr: impl Into<String>, router: Router, grace_period: Duration) -> Self {
        Self {
            addr: addr.into(),
            router,
            grace_period,
        }
    }
}

#[async_trait]
impl Service for HttpServer {
    fn name(&self) -> &'static str {
        "http-server"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .context("Failed to bind to address")?;
        info!("Starting server on http://{}", listener.local_addr()?);

        let server = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => return result.context("Server error"),
            _ = shutdown.cancelled() => {}
        }

        match tokio::time::timeout(self.grace_period, server).await {
            Ok(result) => {
                result.context("Server error")?;
                info!("Server shutting down gracefully.");
            }
            Err(_) => warn!(
                grace_secs = self.grace_period.as_secs(),
                "in-flight requests did not finish within grace period"
            ),
        }

        Ok(())
    }
}
