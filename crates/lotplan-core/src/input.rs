//! Free-text lot/plan input parsing
//!
//! One query per line. Lines are trimmed, blank lines dropped, and order and
//! duplicates kept: the resolver answers per input line, so two identical
//! lines are two queries.

use std::fmt;

use serde::Serialize;

/// A single trimmed, non-empty lot/plan pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QueryToken(String);

impl QueryToken {
    /// Returns `None` for empty or whitespace-only input
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for QueryToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split raw textarea content into query tokens
pub fn parse_queries(text: &str) -> Vec<QueryToken> {
    text.lines().filter_map(QueryToken::new).collect()
}
