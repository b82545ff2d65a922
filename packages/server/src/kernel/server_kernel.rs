// ServerKernel - opened infrastructure handles for one process
//
// Connections are opened once at startup and closed on shutdown. Components
// receive the handles they need explicitly; there are no globals.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use super::{LogNotifier, RedisWorkQueue, ServerDeps};
use crate::config::Config;
use crate::domains::reviews::{
    KeywordClassifier, ModerationConfig, ModerationConsumer, NotificationConfig,
    NotificationConsumer, PostgresReviewRepository,
};
use crate::kernel::BaseWorkQueue;

pub struct ServerKernel {
    pub db_pool: PgPool,
    pub redis: redis::Client,
    pub deps: ServerDeps,
    config: Config,
}

impl ServerKernel {
    /// Connect to Postgres and Redis, run migrations and build the shared deps.
    ///
    /// Failing to reach either store here is fatal for the process.
    pub async fn connect(config: &Config) -> Result<Self> {
        info!("Connecting to database...");
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;
        info!("Database connected");

        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;
        info!("Migrations complete");

        let redis = redis::Client::open(config.redis_url.as_str()).context("Invalid REDIS_URL")?;
        let intake_queue = RedisWorkQueue::connect(&redis)
            .await
            .context("Failed to connect to redis")?;
        intake_queue.ping().await.context("Can't ping redis")?;
        info!("Queue store connected");

        let classifier = KeywordClassifier::new(
            config.moderation_blocklist.iter(),
            config.moderation_match_mode,
        )
        .context("Invalid moderation blocklist")?;
        info!(
            tokens = classifier.tokens().len(),
            mode = ?classifier.mode(),
            "Moderation classifier configured"
        );

        let deps = ServerDeps::new(
            Arc::new(PostgresReviewRepository::new(db_pool.clone())),
            Arc::new(intake_queue),
            Arc::new(classifier),
            Arc::new(LogNotifier::new()),
        );

        Ok(Self {
            db_pool,
            redis,
            deps,
            config: config.clone(),
        })
    }

    /// Moderation consumer with its own Redis connection.
    pub async fn moderation_consumer(&self) -> Result<ModerationConsumer> {
        let queue = RedisWorkQueue::connect(&self.redis)
            .await
            .context("Failed to open moderation queue connection")?;

        Ok(ModerationConsumer::with_config(
            self.deps.reviews.clone(),
            Arc::new(queue),
            self.deps.classifier.clone(),
            ModerationConfig {
                processing_timeout: self.config.moderation_timeout,
                poll_timeout: self.config.queue_poll_timeout,
                ..Default::default()
            },
        ))
    }

    /// Notification consumer with its own Redis connection.
    pub async fn notification_consumer(&self) -> Result<NotificationConsumer> {
        let queue = RedisWorkQueue::connect(&self.redis)
            .await
            .context("Failed to open notification queue connection")?;

        Ok(NotificationConsumer::with_config(
            self.deps.reviews.clone(),
            Arc::new(queue),
            self.deps.notifier.clone(),
            NotificationConfig {
                poll_timeout: self.config.queue_poll_timeout,
                ..Default::default()
            },
        ))
    }

    /// Close the database pool. Redis connections close when their handles drop.
    pub async fn close(self) {
        info!("Closing database pool");
        self.db_pool.close().await;
    }
}
