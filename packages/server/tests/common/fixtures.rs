//! Test fixtures for review submissions.

use review_core::domains::reviews::NewReview;
use serde_json::{json, Value};

/// Build a submission from its parts.
pub fn new_review(
    product_id: i32,
    reviewer_name: &str,
    email: &str,
    rating: i32,
    comment_text: &str,
) -> NewReview {
    NewReview {
        product_id,
        reviewer_name: reviewer_name.to_string(),
        email: email.to_string(),
        comment_text: comment_text.to_string(),
        rating,
    }
}

/// A clean review that moderation accepts.
pub fn ann_review() -> NewReview {
    new_review(1, "Ann", "a@example.com", 4, "Great product")
}

/// A review containing a disallowed word.
pub fn bob_review() -> NewReview {
    new_review(1, "Bob", "b@example.com", 1, "total cruul service")
}

/// A review with an invalid product id.
pub fn cid_review() -> NewReview {
    new_review(0, "Cid", "c@example.com", 3, "ok")
}

/// JSON body for a submission, using the public field names.
pub fn review_json(review: &NewReview) -> Value {
    json!({
        "productId": review.product_id,
        "reviewerName": review.reviewer_name,
        "email": review.email,
        "commentText": review.comment_text,
        "rating": review.rating,
    })
}
