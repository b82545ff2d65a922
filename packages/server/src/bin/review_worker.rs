//! Review pipeline worker
//!
//! Runs the moderation and notification consumers without an HTTP listener.

use anyhow::{Context, Result};
use review_core::{
    kernel::{ServerKernel, ServiceHost},
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
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    tracing::info!("Starting review pipeline worker");

    let config = Config::from_env().context("Failed to load configuration")?;
    let kernel = ServerKernel::connect(&config).await?;

    let result = ServiceHost::new(config.worker_grace())
        .with_service(kernel.moderation_consumer().await?)
        .with_service(kernel.notification_consumer().await?)
        .run_until_shutdown()
        .await;

    kernel.close().await;
    result
}
