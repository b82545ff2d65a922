//! Test harness with testcontainers for integration testing.
//!
//! Uses shared containers across all tests. Containers and migrations are
//! initialized once on first use, then reused. Tests using this harness need
//! Docker and are marked `#[ignore]`; run them with `cargo test -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use review_core::domains::reviews::{
    KeywordClassifier, MatchMode, ModerationConfig, ModerationConsumer, NotificationConfig,
    NotificationConsumer, PostgresReviewRepository,
};
use review_core::kernel::test_dependencies::RecordingNotifier;
use review_core::kernel::{RedisWorkQueue, ServerDeps};
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    redis_url: String,
    // Keep containers alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
    _redis: ContainerAsync<Redis>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --ignored --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let redis = Redis::default()
            .start()
            .await
            .context("Failed to start Redis container")?;

        let redis_host = redis.get_host().await?;
        let redis_port = redis.get_host_port_ipv4(6379).await?;
        let redis_url = format!("redis://{}:{}", redis_host, redis_port);

        // Run migrations once on the shared database
        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            redis_url,
            _postgres: postgres,
            _redis: redis,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Test harness wired to real Postgres and Redis.
///
/// The notifier records instead of sending so tests can assert on it.
pub struct TestHarness {
    pub db_pool: PgPool,
    pub redis: redis::Client,
    pub deps: ServerDeps,
    pub notifier: Arc<RecordingNotifier>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;
        let redis = redis::Client::open(infra.redis_url.as_str())?;
        let notifier = Arc::new(RecordingNotifier::new());

        let deps = ServerDeps::new(
            Arc::new(PostgresReviewRepository::new(db_pool.clone())),
            Arc::new(RedisWorkQueue::connect(&redis).await?),
            Arc::new(KeywordClassifier::with_defaults(MatchMode::WordBoundary)?),
            notifier.clone(),
        );

        Ok(Self {
            db_pool,
            redis,
            deps,
            notifier,
        })
    }

    pub async fn moderation_consumer(&self) -> Result<ModerationConsumer> {
        Ok(ModerationConsumer::with_config(
            self.deps.reviews.clone(),
            Arc::new(RedisWorkQueue::connect(&self.redis).await?),
            self.deps.classifier.clone(),
            ModerationConfig {
                poll_timeout: Duration::from_secs(1),
                ..Default::default()
            },
        ))
    }

    pub async fn notification_consumer(&self) -> Result<NotificationConsumer> {
        Ok(NotificationConsumer::with_config(
            self.deps.reviews.clone(),
            Arc::new(RedisWorkQueue::connect(&self.redis).await?),
            self.deps.notifier.clone(),
            NotificationConfig {
                poll_timeout: Duration::from_secs(1),
                ..Default::default()
            },
        ))
    }
}
