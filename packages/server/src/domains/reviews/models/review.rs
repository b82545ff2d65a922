use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

use crate::common::ReviewId;

/// Moderation state of a review.
///
/// Rows are inserted without a status; a NULL column reads as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "review_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Accepted => "accepted",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// True once moderation has recorded a decision.
    pub fn is_final(&self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate review as submitted through the intake API.
///
/// Missing JSON fields fall back to their zero values so that validation,
/// not deserialization, reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewReview {
    pub product_id: i32,
    pub reviewer_name: String,
    pub email: String,
    pub comment_text: String,
    pub rating: i32,
}

/// Review model - SQL persistence layer
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: i32,
    pub reviewer_name: String,
    pub email: String,
    pub comment_text: String,
    pub rating: i32,
    pub status: Option<ReviewStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Current status, treating an unset column as pending.
    pub fn status(&self) -> ReviewStatus {
        self.status.unwrap_or_default()
    }

    /// Build an unsaved row from a submission (used by in-memory stores).
    pub fn from_new(id: ReviewId, new: &NewReview) -> Self {
        let now = Utc::now();
        Self {
            id,
            product_id: new.product_id,
            reviewer_name: new.reviewer_name.clone(),
            email: new.email.clone(),
            comment_text: new.comment_text.clone(),
            rating: new.rating,
            status: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Insert a new review, letting the store assign the identifier
    pub async fn insert(new: &NewReview, pool: &PgPool) -> sqlx::Result<ReviewId> {
        sqlx::query_scalar::<_, ReviewId>(
            "INSERT INTO product_reviews (
                product_id,
                reviewer_name,
                email,
                comment_text,
                rating
             )
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(new.product_id)
        .bind(&new.reviewer_name)
        .bind(&new.email)
        .bind(&new.comment_text)
        .bind(new.rating)
        .fetch_one(pool)
        .await
    }

    /// Find review by ID
    pub async fn find_by_id(id: ReviewId, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, product_id, reviewer_name, email, comment_text, rating, status,
                    created_at, updated_at
             FROM product_reviews
             WHERE id = $1
             LIMIT 1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Set the moderation status. Returns the number of rows touched.
    pub async fn set_status(id: ReviewId, status: ReviewStatus, pool: &PgPool) -> sqlx::Result<u64> {
        let result = sqlx::query(
            "UPDATE product_reviews
             SET status = $1, updated_at = NOW()
             WHERE id = $2",
        )
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_status_reads_as_pending() {
        let review = Review::from_new(ReviewId::new(7), &NewReview::default());
        assert_eq!(review.status(), ReviewStatus::Pending);
        assert!(!review.status().is_final());
    }

    #[test]
    fn new_review_uses_camel_case_fields() {
        let review: NewReview = serde_json::from_str(
            r#"{"productId":1,"reviewerName":"Ann","email":"a@example.com","commentText":"Great product","rating":4}"#,
        )
        .unwrap();

        assert_eq!(review.product_id, 1);
        assert_eq!(review.reviewer_name, "Ann");
        assert_eq!(review.comment_text, "Great product");
        assert_eq!(review.rating, 4);
    }

    #[test]
    fn missing_fields_default_to_zero_values() {
        let review: NewReview = serde_json::from_str(r#"{"reviewerName":"Ann"}"#).unwrap();
        assert_eq!(review.product_id, 0);
        assert!(review.email.is_empty());
    }

    #[test]
    fn status_display_matches_stored_labels() {
        assert_eq!(ReviewStatus::Accepted.to_string(), "accepted");
        assert_eq!(ReviewStatus::Rejected.to_string(), "rejected");
        assert_eq!(ReviewStatus::Pending.to_string(), "pending");
    }
}
