//! Moderation consumer.
//!
//! ```text
//! pending-review ──pop──► load review ──► classify ──► update status ──push──► reviewed
//! ```
//!
//! Each message is processed under a deadline measured from the pop. Any
//! failure (missing row, store error, deadline) is logged and the message is
//! dropped; nothing is retried or dead-lettered. Reprocessing an id re-runs
//! the classifier and overwrites the stored status.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::classifier::ContentClassifier;
use crate::common::ReviewId;
use crate::domains::reviews::error::ReviewError;
use crate::domains::reviews::models::ReviewStatus;
use crate::domains::reviews::repository::ReviewRepository;
use crate::kernel::queue::{next_delivery, Delivery};
use crate::kernel::service_host::Service;
use crate::kernel::{BaseWorkQueue, QueueName};

/// Configuration for the moderation consumer.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Deadline for handling one message, from dequeue to the `reviewed` push.
    pub processing_timeout: Duration,
    /// How long a single blocking pop waits before re-checking for shutdown.
    pub poll_timeout: Duration,
    /// Pause after a queue failure before popping again.
    pub error_backoff: Duration,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            processing_timeout: Duration::from_secs(15),
            poll_timeout: Duration::from_secs(1),
            error_backoff: Duration::from_secs(1),
        }
    }
}

pub struct ModerationConsumer {
    reviews: Arc<dyn ReviewRepository>,
    /// Dedicated handle: a blocking pop ties up its connection.
    queue: Arc<dyn BaseWorkQueue>,
    classifier: Arc<dyn ContentClassifier>,
    config: ModerationConfig,
}

impl ModerationConsumer {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        queue: Arc<dyn BaseWorkQueue>,
        classifier: Arc<dyn ContentClassifier>,
    ) -> Self {
        Self::with_config(reviews, queue, classifier, ModerationConfig::default())
    }

    pub fn with_config(
        reviews: Arc<dyn ReviewRepository>,
        queue: Arc<dyn BaseWorkQueue>,
        classifier: Arc<dyn ContentClassifier>,
        config: ModerationConfig,
    ) -> Self {
        Self {
            reviews,
            queue,
            classifier,
            config,
        }
    }

    /// Screen one review, persist the decision and forward it for notification.
    pub async fn moderate(&self, id: ReviewId) -> Result<ReviewStatus, ReviewError> {
        let review = self.reviews.get(id).await?;

        let verdict = self
            .classifier
            .classify(&review.comment_text)
            .await
            .map_err(ReviewError::Classification)?;

        debug!(
            review_id = %id,
            status = %verdict.status,
            matched = verdict.matched.as_deref().unwrap_or(""),
            "flagging review"
        );

        self.reviews.update_status(id, verdict.status).await?;
        self.queue.push(QueueName::Reviewed, id).await?;

        Ok(verdict.status)
    }

    /// Handle a dequeued message within the configured deadline.
    pub async fn process(&self, id: ReviewId) -> Result<ReviewStatus, ReviewError> {
        let deadline = self.config.processing_timeout;

        match tokio::time::timeout(deadline, self.moderate(id)).await {
            Ok(result) => result,
            Err(_) => Err(ReviewError::DeadlineExceeded(deadline)),
        }
    }

    async fn handle(&self, id: ReviewId) {
        match self.process(id).await {
            Ok(status) => info!(review_id = %id, status = %status, "review moderated"),
            Err(e @ ReviewError::NotFound(_)) => {
                warn!(review_id = %id, error = %e, "dropping moderation message")
            }
            Err(e) => error!(review_id = %id, error = %e, "error verifying review"),
        }
    }
}

#[async_trait]
impl Service for ModerationConsumer {
    fn name(&self) -> &'static str {
        "moderation-consumer"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        info!(
            queue = %QueueName::PendingReview,
            timeout_secs = self.config.processing_timeout.as_secs(),
            "moderation consumer starting"
        );

        loop {
            match next_delivery(
                self.queue.as_ref(),
                QueueName::PendingReview,
                self.config.poll_timeout,
                &shutdown,
            )
            .await
            {
                Delivery::Message(id) => self.handle(id).await,
                Delivery::Idle => continue,
                Delivery::Shutdown => break,
                Delivery::Failed(e) => {
                    error!(error = %e, "failed to dequeue pending review");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.error_backoff) => {}
                    }
                }
            }
        }

        info!("moderation consumer stopped");
        Ok(())
    }
}
