//! Redis-backed work queues.
//!
//! Two lists carry review identifiers between pipeline stages:
//! `pending-review` (intake → moderation) and `reviewed` (moderation →
//! notification). Messages are the decimal id and nothing else. There is no
//! acknowledgement: a consumer that dies after popping loses the message.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::common::ReviewId;
use crate::kernel::BaseWorkQueue;

/// The named queues used by the review pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueName {
    PendingReview,
    Reviewed,
}

impl QueueName {
    /// Redis list key.
    pub fn key(&self) -> &'static str {
        match self {
            QueueName::PendingReview => "pending-review",
            QueueName::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("malformed message on {queue}: {payload:?}")]
    MalformedMessage { queue: QueueName, payload: String },

    #[error("unexpected reply from {got}, expected {expected}")]
    UnexpectedQueue { expected: QueueName, got: String },

    #[error("queue unavailable: {0}")]
    Unavailable(String),
}

/// Queue handle over one Redis connection.
///
/// A blocking pop occupies its connection for the whole wait, so every
/// consumer must own a handle of its own. Intake shares a separate one.
#[derive(Clone)]
pub struct RedisWorkQueue {
    conn: MultiplexedConnection,
}

impl RedisWorkQueue {
    /// Open a new dedicated connection.
    pub async fn connect(client: &redis::Client) -> Result<Self, QueueError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl BaseWorkQueue for RedisWorkQueue {
    async fn push(&self, queue: QueueName, id: ReviewId) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let length: i64 = redis::cmd("RPUSH")
            .arg(queue.key())
            .arg(id.to_string())
            .query_async(&mut conn)
            .await?;

        debug!(queue = %queue, review_id = %id, length, "enqueued");
        Ok(())
    }

    async fn pop(&self, queue: QueueName, wait: Duration) -> Result<Option<ReviewId>, QueueError> {
        let mut conn = self.conn.clone();
        // BLPOP treats 0 as "block forever"; always pass a bounded timeout.
        let timeout_secs = wait.as_secs().max(1);

        let reply: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(queue.key())
            .arg(timeout_secs)
            .query_async(&mut conn)
            .await?;

        let Some((list, payload)) = reply else {
            return Ok(None);
        };

        if list != queue.key() {
            return Err(QueueError::UnexpectedQueue {
                expected: queue,
                got: list,
            });
        }

        payload
            .parse::<ReviewId>()
            .map(Some)
            .map_err(|_| QueueError::MalformedMessage { queue, payload })
    }

    async fn ping(&self) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Result of waiting for the next message on a queue.
#[derive(Debug)]
pub enum Delivery {
    Message(ReviewId),
    /// The poll window elapsed with nothing to do.
    Idle,
    Shutdown,
    Failed(QueueError),
}

/// Wait for the next message unless `shutdown` has already fired.
///
/// The token is only checked between pops. Once `BLPOP` is on the wire the
/// server may already have removed the head, so the reply is always read and
/// handed back even if shutdown starts meanwhile. `poll` bounds how long an
/// idle queue can hold up shutdown.
pub async fn next_delivery(
    queue: &dyn BaseWorkQueue,
    name: QueueName,
    poll: Duration,
    shutdown: &CancellationToken,
) -> Delivery {
    if shutdown.is_cancelled() {
        return Delivery::Shutdown;
    }

    match queue.pop(name, poll).await {
        Ok(Some(id)) => Delivery::Message(id),
        Ok(None) => Delivery::Idle,
        Err(e) => Delivery::Failed(e),
    }
}
