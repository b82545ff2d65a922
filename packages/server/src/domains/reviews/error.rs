use std::time::Duration;

use thiserror::Error;

use crate::common::ReviewId;
use crate::kernel::QueueError;

/// A submission that breaks one of the review invariants.
///
/// Variants are checked in declaration order; only the first failure is reported.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid product ID")]
    InvalidProductId,

    #[error("name is empty")]
    EmptyName,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid rating value")]
    InvalidRating,
}

impl ValidationError {
    /// Name of the offending field in the public JSON payload.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidProductId => "productId",
            ValidationError::EmptyName => "reviewerName",
            ValidationError::InvalidEmail => "email",
            ValidationError::InvalidRating => "rating",
        }
    }
}

/// Errors raised while submitting, moderating or notifying on a review.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("review {0} not found")]
    NotFound(ReviewId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("expected to update one row for review {id}, updated {updated}")]
    UnexpectedRowCount { id: ReviewId, updated: u64 },

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("classification failed: {0}")]
    Classification(#[source] anyhow::Error),

    #[error("notification dispatch failed: {0}")]
    Dispatch(#[source] anyhow::Error),

    #[error("processing exceeded the {0:?} deadline")]
    DeadlineExceeded(Duration),
}

impl ReviewError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ReviewError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReviewError::NotFound(_))
    }

    /// Store unavailable or a constraint / row-count violation.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            ReviewError::Database(_) | ReviewError::UnexpectedRowCount { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_problem() {
        assert_eq!(ValidationError::InvalidProductId.to_string(), "invalid product ID");
        assert_eq!(ValidationError::EmptyName.to_string(), "name is empty");
        assert_eq!(ValidationError::InvalidEmail.to_string(), "invalid email address");
        assert_eq!(ValidationError::InvalidRating.to_string(), "invalid rating value");
    }

    #[test]
    fn validation_error_is_transparent() {
        let err: ReviewError = ValidationError::EmptyName.into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "name is empty");
    }

    #[test]
    fn row_count_mismatch_is_a_persistence_error() {
        let err = ReviewError::UnexpectedRowCount {
            id: ReviewId::new(3),
            updated: 0,
        };
        assert!(err.is_persistence());
        assert!(!err.is_not_found());
    }
}
