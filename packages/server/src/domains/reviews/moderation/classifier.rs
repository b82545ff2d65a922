//! Content screening for submitted reviews.
//!
//! `KeywordClassifier` is a placeholder for a real classification engine. It
//! rejects a comment when a disallowed token appears in the lower-cased text.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;

use crate::domains::reviews::models::ReviewStatus;

/// Tokens rejected when no blocklist is configured.
pub const DEFAULT_BLOCKLIST: &[&str] = &["fee", "nee", "cruul", "leent"];

/// Outcome of screening one comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationVerdict {
    pub status: ReviewStatus,
    /// The token that caused a rejection, if any.
    pub matched: Option<String>,
}

impl ModerationVerdict {
    pub fn accepted() -> Self {
        Self {
            status: ReviewStatus::Accepted,
            matched: None,
        }
    }

    pub fn rejected(token: impl Into<String>) -> Self {
        Self {
            status: ReviewStatus::Rejected,
            matched: Some(token.into()),
        }
    }
}

#[async_trait]
pub trait ContentClassifier: Send + Sync {
    /// Decide whether a comment is accepted or rejected.
    async fn classify(&self, comment: &str) -> Result<ModerationVerdict>;
}

/// How blocklist tokens are matched against a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Token must appear as a whole word ("fee" does not match "feel").
    #[default]
    WordBoundary,
    /// Token may appear anywhere, including inside other words.
    Substring,
}

impl FromStr for MatchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" | "word_boundary" | "word-boundary" => Ok(MatchMode::WordBoundary),
            "substring" => Ok(MatchMode::Substring),
            other => Err(anyhow!("unknown moderation match mode: {}", other)),
        }
    }
}

/// Blocklist classifier.
pub struct KeywordClassifier {
    tokens: Vec<String>,
    mode: MatchMode,
    patterns: Vec<Regex>,
}

impl KeywordClassifier {
    pub fn new<I, S>(tokens: I, mode: MatchMode) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let patterns = match mode {
            MatchMode::WordBoundary => tokens
                .iter()
                .map(|t| Regex::new(&word_pattern(t)))
                .collect::<Result<Vec<_>, _>>()?,
            MatchMode::Substring => Vec::new(),
        };

        Ok(Self {
            tokens,
            mode,
            patterns,
        })
    }

    /// Classifier over [`DEFAULT_BLOCKLIST`].
    pub fn with_defaults(mode: MatchMode) -> Result<Self> {
        Self::new(DEFAULT_BLOCKLIST.iter().copied(), mode)
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Synchronous check used by the async trait impl.
    pub fn screen(&self, comment: &str) -> ModerationVerdict {
        let normalized = comment.to_lowercase();

        let hit = match self.mode {
            MatchMode::Substring => self.tokens.iter().find(|t| normalized.contains(t.as_str())),
            MatchMode::WordBoundary => self
                .tokens
                .iter()
                .zip(&self.patterns)
                .find(|(_, pattern)| pattern.is_match(&normalized))
                .map(|(token, _)| token),
        };

        match hit {
            Some(token) => ModerationVerdict::rejected(token.clone()),
            None => ModerationVerdict::accepted(),
        }
    }
}

/// `\b` only holds next to a word character, so edges that end in
/// punctuation are left unanchored.
fn word_pattern(token: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if token.starts_with(is_word) { r"\b" } else { "" };
    let trail = if token.ends_with(is_word) { r"\b" } else { "" };
    format!("{}{}{}", lead, regex::escape(token), trail)
}

#[async_trait]
impl ContentClassifier for KeywordClassifier {
    async fn classify(&self, comment: &str) -> Result<ModerationVerdict> {
        Ok(self.screen(comment))
    }
}
