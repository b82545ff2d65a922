//! Notification dispatch.
//!
//! There is no mail transport yet; `LogNotifier` writes the notice to the log.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::domains::reviews::ReviewNotification;
use crate::kernel::BaseNotifier;

/// Notifier that records each notice as a structured log line.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BaseNotifier for LogNotifier {
    async fn notify(&self, notification: &ReviewNotification) -> Result<()> {
        info!(
            review_id = %notification.review_id,
            recipient = %notification.recipient,
            status = %notification.status,
            "{}",
            notification
        );
        Ok(())
    }
}
