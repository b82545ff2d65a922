//! Notification stage: tells the reviewer how moderation went.

pub mod consumer;

use std::fmt;

use serde::Serialize;

use crate::common::ReviewId;
use crate::domains::reviews::models::{Review, ReviewStatus};

pub use consumer::{NotificationConfig, NotificationConsumer};

/// A completion notice addressed to the reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewNotification {
    pub review_id: ReviewId,
    pub recipient: String,
    pub status: ReviewStatus,
}

impl ReviewNotification {
    pub fn for_review(review: &Review) -> Self {
        Self {
            review_id: review.id,
            recipient: review.email.clone(),
            status: review.status(),
        }
    }
}

impl fmt::Display for ReviewNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Email to {}: review {} was {}",
            self.recipient, self.review_id, self.status
        )
    }
}
