//! Integration tests against real Postgres and Redis containers.
//!
//! These need Docker: `cargo test -- --ignored`.

mod common;

use std::time::Duration;

use review_core::common::ReviewId;
use review_core::domains::reviews::{submit_review, ReviewError, ReviewRepository, ReviewStatus};
use review_core::kernel::{BaseWorkQueue, Service};
use test_context::test_context;
use tokio_util::sync::CancellationToken;

use crate::common::{ann_review, bob_review, cid_review, TestHarness};

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn repository_round_trips_status(ctx: &TestHarness) {
    let repo = &ctx.deps.reviews;

    let id = repo.create(&ann_review()).await.unwrap();
    assert!(id.into_inner() >= 1);

    let stored = repo.get(id).await.unwrap();
    assert_eq!(stored.reviewer_name, "Ann");
    assert_eq!(stored.status, None);

    repo.update_status(id, ReviewStatus::Rejected).await.unwrap();
    assert_eq!(repo.get(id).await.unwrap().status(), ReviewStatus::Rejected);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn repository_reports_missing_rows(ctx: &TestHarness) {
    let repo = &ctx.deps.reviews;
    let missing = ReviewId::new(i64::MAX);

    assert!(matches!(
        repo.get(missing).await.unwrap_err(),
        ReviewError::NotFound(id) if id == missing
    ));
    assert!(matches!(
        repo.update_status(missing, ReviewStatus::Accepted)
            .await
            .unwrap_err(),
        ReviewError::UnexpectedRowCount { updated: 0, .. }
    ));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn health_checks_reach_both_stores(ctx: &TestHarness) {
    ctx.deps.reviews.ping().await.unwrap();
    ctx.deps.queue.ping().await.unwrap();
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn invalid_review_is_not_persisted(ctx: &TestHarness) {
    let before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_reviews WHERE product_id = 0")
        .fetch_one(&ctx.db_pool)
        .await
        .unwrap();

    let err = submit_review(cid_review(), &ctx.deps).await.unwrap_err();
    assert!(err.is_validation());

    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_reviews WHERE product_id = 0")
        .fetch_one(&ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(before, after);
}

/// Scenarios A and B share one set of consumers so that no other test steals
/// messages from the shared Redis lists.
#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn reviews_are_moderated_and_notified_through_redis(ctx: &TestHarness) {
    let shutdown = CancellationToken::new();
    let moderation = Box::new(ctx.moderation_consumer().await.unwrap());
    let notification = Box::new(ctx.notification_consumer().await.unwrap());
    let handles = vec![
        tokio::spawn(moderation.run(shutdown.clone())),
        tokio::spawn(notification.run(shutdown.clone())),
    ];

    let accepted = submit_review(ann_review(), &ctx.deps).await.unwrap();
    let rejected = submit_review(bob_review(), &ctx.deps).await.unwrap();

    let sent = ctx.notifier.wait_for(2, Duration::from_secs(20)).await;

    shutdown.cancel();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let status_of = |id: ReviewId| {
        sent.iter()
            .find(|n| n.review_id == id)
            .map(|n| n.status)
    };
    assert_eq!(status_of(accepted), Some(ReviewStatus::Accepted));
    assert_eq!(status_of(rejected), Some(ReviewStatus::Rejected));

    assert_eq!(
        ctx.deps.reviews.get(accepted).await.unwrap().status(),
        ReviewStatus::Accepted
    );
    assert_eq!(
        ctx.deps.reviews.get(rejected).await.unwrap().status(),
        ReviewStatus::Rejected
    );
}
