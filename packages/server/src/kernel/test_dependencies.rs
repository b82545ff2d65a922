// TestDependencies - in-memory implementations for testing
//
// Provides fake store, queue and notifier that can be injected into
// ServerDeps and the pipeline consumers without Postgres or Redis.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

use super::{BaseNotifier, BaseWorkQueue, QueueError, QueueName, ServerDeps};
use crate::common::ReviewId;
use crate::domains::reviews::{
    KeywordClassifier, MatchMode, NewReview, Review, ReviewError, ReviewNotification,
    ReviewRepository, ReviewStatus,
};

// =============================================================================
// In-memory Review Repository
// =============================================================================

#[derive(Default)]
pub struct InMemoryReviewRepository {
    rows: Mutex<HashMap<ReviewId, Review>>,
    next_id: AtomicI64,
    fail_writes: AtomicBool,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create` and `update_status` fail as if the store were down.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Remove a row behind the pipeline's back.
    pub fn delete(&self, id: ReviewId) -> Option<Review> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).remove(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> Result<(), ReviewError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ReviewError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn create(&self, review: &NewReview) -> Result<ReviewId, ReviewError> {
        self.check_writable()?;

        let id = ReviewId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Review::from_new(id, review));
        Ok(id)
    }

    async fn get(&self, id: ReviewId) -> Result<Review, ReviewError> {
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
            .ok_or(ReviewError::NotFound(id))
    }

    async fn update_status(&self, id: ReviewId, status: ReviewStatus) -> Result<(), ReviewError> {
        self.check_writable()?;

        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        match rows.get_mut(&id) {
            Some(review) => {
                review.status = Some(status);
                review.updated_at = chrono::Utc::now();
                Ok(())
            }
            None => Err(ReviewError::UnexpectedRowCount { id, updated: 0 }),
        }
    }

    async fn ping(&self) -> Result<(), ReviewError> {
        Ok(())
    }
}

// =============================================================================
// In-memory Work Queue
// =============================================================================

/// FIFO queues with the same blocking-pop contract as the Redis lists.
#[derive(Default)]
pub struct InMemoryWorkQueue {
    lists: Mutex<HashMap<QueueName, VecDeque<ReviewId>>>,
    notify: Notify,
    fail_pushes: AtomicBool,
    fail_pops: AtomicBool,
    /// Delay between removing the head and returning it, in milliseconds.
    pop_latency_ms: AtomicU64,
}

impl InMemoryWorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_pushes(&self, fail: bool) {
        self.fail_pushes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pops(&self, fail: bool) {
        self.fail_pops.store(fail, Ordering::SeqCst);
    }

    /// Hold each popped id for `latency` before returning it, the way a
    /// Redis reply arrives after the server has already removed the element.
    pub fn set_pop_latency(&self, latency: Duration) {
        self.pop_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Snapshot of what is waiting on a queue, head first.
    pub fn queued(&self, queue: QueueName) -> Vec<ReviewId> {
        self.lists
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&queue)
            .map(|list| list.iter().copied().collect())
            .unwrap_or_default()
    }

    fn try_pop(&self, queue: QueueName) -> Option<ReviewId> {
        self.lists
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&queue)
            .and_then(VecDeque::pop_front)
    }

    async fn reply(&self, id: Option<ReviewId>) -> Option<ReviewId> {
        let latency = self.pop_latency_ms.load(Ordering::SeqCst);
        if id.is_some() && latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        id
    }
}

#[async_trait]
impl BaseWorkQueue for InMemoryWorkQueue {
    async fn push(&self, queue: QueueName, id: ReviewId) -> Result<(), QueueError> {
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("push disabled by test".to_string()));
        }

        self.lists
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(queue)
            .or_default()
            .push_back(id);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn pop(&self, queue: QueueName, wait: Duration) -> Result<Option<ReviewId>, QueueError> {
        if self.fail_pops.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("pop disabled by test".to_string()));
        }

        let deadline = tokio::time::Instant::now() + wait;
        loop {
            // Register interest before checking so a concurrent push is not missed.
            let notified = self.notify.notified();
            if let Some(id) = self.try_pop(queue) {
                return Ok(self.reply(Some(id)).await);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                let id = self.try_pop(queue);
                return Ok(self.reply(id).await);
            }
        }
    }
}

// =============================================================================
// Recording Notifier
// =============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<ReviewNotification>>,
    notify: Notify,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ReviewNotification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Wait until at least `count` notifications have been recorded.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<ReviewNotification> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.sent();
            }
        }
    }
}

#[async_trait]
impl BaseNotifier for RecordingNotifier {
    async fn notify(&self, notification: &ReviewNotification) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        self.notify.notify_waiters();
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of in-memory fakes, kept as concrete types so tests can inspect them.
#[derive(Clone)]
pub struct TestDependencies {
    pub reviews: Arc<InMemoryReviewRepository>,
    pub queue: Arc<InMemoryWorkQueue>,
    pub classifier: Arc<KeywordClassifier>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self::with_match_mode(MatchMode::WordBoundary)
    }

    pub fn with_match_mode(mode: MatchMode) -> Self {
        Self {
            reviews: Arc::new(InMemoryReviewRepository::new()),
            queue: Arc::new(InMemoryWorkQueue::new()),
            classifier: Arc::new(
                KeywordClassifier::with_defaults(mode).expect("default blocklist compiles"),
            ),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.reviews.clone(),
            self.queue.clone(),
            self.classifier.clone(),
            self.notifier.clone(),
        )
    }
}
