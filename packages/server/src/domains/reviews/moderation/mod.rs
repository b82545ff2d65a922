//! Moderation stage: screens pending reviews and records the decision.

pub mod classifier;
pub mod consumer;

pub use classifier::{
    ContentClassifier, KeywordClassifier, MatchMode, ModerationVerdict, DEFAULT_BLOCKLIST,
};
pub use consumer::{ModerationConfig, ModerationConsumer};
