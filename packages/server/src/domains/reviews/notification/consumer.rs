//! Notification consumer.
//!
//! Pops identifiers from `reviewed`, reloads the review and dispatches a
//! notice with its final status. Load or dispatch failures are logged and
//! the message is dropped.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::ReviewNotification;
use crate::common::ReviewId;
use crate::domains::reviews::error::ReviewError;
use crate::domains::reviews::repository::ReviewRepository;
use crate::kernel::queue::{next_delivery, Delivery};
use crate::kernel::service_host::Service;
use crate::kernel::{BaseNotifier, BaseWorkQueue, QueueName};

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub poll_timeout: Duration,
    pub error_backoff: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(1),
            error_backoff: Duration::from_secs(1),
        }
    }
}

pub struct NotificationConsumer {
    reviews: Arc<dyn ReviewRepository>,
    queue: Arc<dyn BaseWorkQueue>,
    notifier: Arc<dyn BaseNotifier>,
    config: NotificationConfig,
}

impl NotificationConsumer {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        queue: Arc<dyn BaseWorkQueue>,
        notifier: Arc<dyn BaseNotifier>,
    ) -> Self {
        Self::with_config(reviews, queue, notifier, NotificationConfig::default())
    }

    pub fn with_config(
        reviews: Arc<dyn ReviewRepository>,
        queue: Arc<dyn BaseWorkQueue>,
        notifier: Arc<dyn BaseNotifier>,
        config: NotificationConfig,
    ) -> Self {
        Self {
            reviews,
            queue,
            notifier,
            config,
        }
    }

    /// Load a moderated review and send its notice.
    pub async fn notify(&self, id: ReviewId) -> Result<ReviewNotification, ReviewError> {
        let review = self.reviews.get(id).await?;
        let notification = ReviewNotification::for_review(&review);

        self.notifier
            .notify(&notification)
            .await
            .map_err(ReviewError::Dispatch)?;

        Ok(notification)
    }

    async fn handle(&self, id: ReviewId) {
        match self.notify(id).await {
            Ok(notification) => {
                info!(review_id = %id, status = %notification.status, "reviewer notified")
            }
            Err(e @ ReviewError::NotFound(_)) => {
                warn!(review_id = %id, error = %e, "dropping notification message")
            }
            Err(e) => error!(review_id = %id, error = %e, "failed to notify reviewer"),
        }
    }
}

#[async_trait]
impl Service for NotificationConsumer {
    fn name(&self) -> &'static str {
        "notification-consumer"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        info!(queue = %QueueName::Reviewed, "notification consumer starting");

        loop {
            match next_delivery(
                self.queue.as_ref(),
                QueueName::Reviewed,
                self.config.poll_timeout,
                &shutdown,
            )
            .await
            {
                Delivery::Message(id) => self.handle(id).await,
                Delivery::Idle => continue,
                Delivery::Shutdown => break,
                Delivery::Failed(e) => {
                    error!(error = %e, "failed to dequeue reviewed message");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.error_backoff) => {}
                    }
                }
            }
        }

        info!("notification consumer stopped");
        Ok(())
    }
}
