//! Synchronous checks applied to every submission before it is stored.

use super::error::ValidationError;
use super::models::NewReview;

pub const MIN_RATING: i32 = 0;
pub const MAX_RATING: i32 = 5;

/// Validate a candidate review.
///
/// Checks run in a fixed order (product, name, email, rating) and the first
/// violation wins. The email check is only a shape check for an `@`.
pub fn validate(review: &NewReview) -> Result<(), ValidationError> {
    if review.product_id < 1 {
        return Err(ValidationError::InvalidProductId);
    }

    if review.reviewer_name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if !review.email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    if !(MIN_RATING..=MAX_RATING).contains(&review.rating) {
        return Err(ValidationError::InvalidRating);
    }

    Ok(())
}
