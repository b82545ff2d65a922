//! Submit review action - validate, persist, then hand off to moderation

use tracing::{debug, error, info};

use crate::common::ReviewId;
use crate::domains::reviews::error::ReviewError;
use crate::domains::reviews::models::NewReview;
use crate::domains::reviews::validation::validate;
use crate::kernel::{QueueName, ServerDeps};

/// Accept a new review.
///
/// This action:
/// 1. Validates the submission (nothing is stored on failure)
/// 2. Inserts the row; the store assigns the identifier
/// 3. Pushes the identifier onto `pending-review`
///
/// The insert and the push are not atomic. If the push fails the row stays
/// unmoderated and the caller gets a queue error; the orphaned id is logged.
pub async fn submit_review(review: NewReview, deps: &ServerDeps) -> Result<ReviewId, ReviewError> {
    validate(&review)?;

    let id = deps.reviews.create(&review).await?;
    debug!(review_id = %id, product_id = review.product_id, "review stored");

    if let Err(e) = deps.queue.push(QueueName::PendingReview, id).await {
        error!(
            review_id = %id,
            error = %e,
            "failed to enqueue review for moderation; row left unmoderated"
        );
        return Err(e.into());
    }

    info!(review_id = %id, product_id = review.product_id, "review submitted");
    Ok(id)
}
