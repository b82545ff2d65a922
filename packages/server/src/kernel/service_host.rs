//! Long-running service hosting with cooperative shutdown.
//!
//! ```ignore
//! ServiceHost::new(Duration::from_secs(5))
//!     .with_service(ModerationConsumer::new(...))
//!     .with_service(NotificationConsumer::new(...))
//!     .run_until_shutdown()
//!     .await?;
//! ```

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A long-running task that stops when its token is cancelled.
#[async_trait]
pub trait Service: Send + 'static {
    fn name(&self) -> &'static str;

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()>;
}

pub struct ServiceHost {
    services: Vec<Box<dyn Service>>,
    shutdown: CancellationToken,
    grace_period: Duration,
}

impl ServiceHost {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            services: Vec::new(),
            shutdown: CancellationToken::new(),
            grace_period,
        }
    }

    pub fn with_service(mut self, service: impl Service) -> Self {
        self.services.push(Box::new(service));
        self
    }

    /// Token cancelled when the host begins shutting down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run until Ctrl+C or SIGTERM, then stop all services.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            wait_for_signal().await;
            info!("received shutdown signal");
            shutdown.cancel();
        });

        self.run().await
    }

    /// Run until the host token is cancelled or any service exits.
    ///
    /// After cancellation services get `grace_period` to return; stragglers
    /// are aborted.
    pub async fn run(self) -> Result<()> {
        let mut tasks = JoinSet::new();

        for service in self.services {
            let name = service.name();
            let token = self.shutdown.child_token();
            info!(service = name, "starting service");
            tasks.spawn(async move { (name, service.run(token).await) });
        }

        let mut first_error = None;

        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            Some(joined) = tasks.join_next() => {
                // A service stopping on its own takes the rest down with it.
                record_exit(joined, &mut first_error);
                self.shutdown.cancel();
            }
        }

        let drain = async {
            while let Some(joined) = tasks.join_next().await {
                record_exit(joined, &mut first_error);
            }
        };

        if tokio::time::timeout(self.grace_period, drain).await.is_err() {
            warn!(
                grace_secs = self.grace_period.as_secs(),
                "services did not stop within grace period; aborting"
            );
            tasks.abort_all();
        }

        info!("all services stopped");
        first_error.map_or(Ok(()), Err)
    }
}

fn record_exit(
    joined: std::result::Result<(&'static str, Result<()>), tokio::task::JoinError>,
    first_error: &mut Option<anyhow::Error>,
) {
    match joined {
        Ok((name, Ok(()))) => info!(service = name, "service stopped"),
        Ok((name, Err(e))) => {
            error!(service = name, error = %e, "service failed");
            first_error.get_or_insert(e);
        }
        Err(e) => {
            error!(error = %e, "service task panicked");
            first_error.get_or_insert(anyhow::anyhow!("service task panicked: {}", e));
        }
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct UntilCancelled {
        stopped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Service for UntilCancelled {
        fn name(&self) -> &'static str {
            "until-cancelled"
        }

        async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
            shutdown.cancelled().await;
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Service for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(self: Box<Self>, _shutdown: CancellationToken) -> Result<()> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    struct Stubborn;

    #[async_trait]
    impl Service for Stubborn {
        fn name(&self) -> &'static str {
            "stubborn"
        }

        async fn run(self: Box<Self>, _shutdown: CancellationToken) -> Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn cancelling_host_stops_services() {
        let stopped = Arc::new(AtomicBool::new(false));
        let host = ServiceHost::new(Duration::from_secs(1)).with_service(UntilCancelled {
            stopped: stopped.clone(),
        });
        let token = host.shutdown_token();

        let handle = tokio::spawn(host.run());
        token.cancel();

        handle.await.unwrap().unwrap();
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failing_service_shuts_down_the_rest() {
        let stopped = Arc::new(AtomicBool::new(false));
        let result = ServiceHost::new(Duration::from_secs(1))
            .with_service(UntilCancelled {
                stopped: stopped.clone(),
            })
            .with_service(Failing)
            .run()
            .await;

        assert!(result.is_err());
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stragglers_are_aborted_after_grace_period() {
        let host = ServiceHost::new(Duration::from_millis(50)).with_service(Stubborn);
        let token = host.shutdown_token();
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), host.run()).await;
        assert!(result.is_ok());
    }
}
