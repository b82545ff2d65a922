// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Review logic lives in domains/reviews and is written against these traits.
//
// Naming convention: Base* for trait names (e.g., BaseWorkQueue, BaseNotifier)

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::common::ReviewId;
use crate::domains::reviews::ReviewNotification;
use crate::kernel::queue::{QueueError, QueueName};

// =============================================================================
// Work Queue Trait (Infrastructure - durable list append / blocking pop)
// =============================================================================

#[async_trait]
pub trait BaseWorkQueue: Send + Sync {
    /// Append an identifier to the tail of a queue.
    async fn push(&self, queue: QueueName, id: ReviewId) -> Result<(), QueueError>;

    /// Remove and return the head of a queue, waiting up to `wait` for one to
    /// arrive. Returns `None` when the wait elapses with the queue still empty.
    async fn pop(&self, queue: QueueName, wait: Duration) -> Result<Option<ReviewId>, QueueError>;

    /// Check the queue store is reachable.
    async fn ping(&self) -> Result<(), QueueError> {
        Ok(())
    }
}

// =============================================================================
// Notification Trait (Infrastructure - outbound completion notices)
// =============================================================================

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// Deliver a completion notice to the reviewer.
    async fn notify(&self, notification: &ReviewNotification) -> Result<()>;
}
