//! Typed identifiers for domain entities.
//!
//! Review identifiers are assigned by the store (`BIGSERIAL`) and travel over
//! the queue as their decimal string form.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a stored product review.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ReviewId(i64);

impl ReviewId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl From<i64> for ReviewId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReviewId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}
