//! Typed CRUD boundary over the review store.
//!
//! Queries always bind parameters. Pooled connections are checked out per
//! call and returned when the future completes or is dropped.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;

use super::error::ReviewError;
use super::models::{NewReview, Review, ReviewStatus};
use crate::common::ReviewId;

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Persist a validated review and return the identifier the store assigned.
    async fn create(&self, review: &NewReview) -> Result<ReviewId, ReviewError>;

    /// Load a review, failing with `NotFound` when it does not exist.
    async fn get(&self, id: ReviewId) -> Result<Review, ReviewError>;

    /// Record a moderation decision. Exactly one row must change.
    async fn update_status(&self, id: ReviewId, status: ReviewStatus) -> Result<(), ReviewError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), ReviewError>;
}

/// PostgreSQL-backed review repository.
#[derive(Clone)]
pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn create(&self, review: &NewReview) -> Result<ReviewId, ReviewError> {
        Review::insert(review, &self.pool).await.map_err(|e| {
            error!(product_id = review.product_id, error = %e, "failed to add review");
            ReviewError::from(e)
        })
    }

    async fn get(&self, id: ReviewId) -> Result<Review, ReviewError> {
        Review::find_by_id(id, &self.pool)
            .await?
            .ok_or(ReviewError::NotFound(id))
    }

    async fn update_status(&self, id: ReviewId, status: ReviewStatus) -> Result<(), ReviewError> {
        let updated = Review::set_status(id, status, &self.pool).await?;

        if updated != 1 {
            return Err(ReviewError::UnexpectedRowCount { id, updated });
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), ReviewError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
