//! Reviews domain - submission, moderation and notification of product reviews
//!
//! Pipeline:
//!   HTTP → submit_review → [pending-review] → ModerationConsumer
//!        → [reviewed] → NotificationConsumer

pub mod actions;
pub mod error;
pub mod models;
pub mod moderation;
pub mod notification;
pub mod repository;
pub mod validation;

// Re-export commonly used types
pub use actions::submit_review;
pub use error::{ReviewError, ValidationError};
pub use models::{NewReview, Review, ReviewStatus};
pub use moderation::{
    ContentClassifier, KeywordClassifier, MatchMode, ModerationConfig, ModerationConsumer,
    ModerationVerdict, DEFAULT_BLOCKLIST,
};
pub use notification::{NotificationConfig, NotificationConsumer, ReviewNotification};
pub use repository::{PostgresReviewRepository, ReviewRepository};
pub use validation::validate;
