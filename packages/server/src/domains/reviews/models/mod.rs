pub mod review;

pub use review::{NewReview, Review, ReviewStatus};
