// Main entry point for API server

use anyhow::{Context, Result};
use review_core::{
    kernel::{ServerKernel, ServiceHost},
    server::{build_app, HttpServer},
    Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,review_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Product Review API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let kernel = ServerKernel::connect(&config).await?;

    let app = build_app(kernel.deps.clone());

    // Consumers get long enough to finish a message they already popped.
    let mut host = ServiceHost::new(config.host_grace(config.run_workers))
        .with_service(HttpServer::new(
            config.listen_addr(),
            app,
            config.shutdown_grace,
        ));

    if config.run_workers {
        host = host
            .with_service(kernel.moderation_consumer().await?)
            .with_service(kernel.notification_consumer().await?);
    } else {
        tracing::info!("Pipeline consumers disabled (RUN_WORKERS=false)");
    }

    let result = host.run_until_shutdown().await;
    kernel.close().await;
    result
}
