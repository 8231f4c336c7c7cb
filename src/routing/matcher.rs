//! Path matching logic.
//!
//! # Responsibilities
//! - Compare a request path against a route's pattern
//! - Reject unsupported pattern syntax when the route is compiled
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Patterns are literal; prefix matching is anchored at the start of
//!   the path and accepts any trailing content
//! - No regex to guarantee O(n) matching

use serde::{Deserialize, Serialize};

/// Characters that only make sense in a regular expression.
const UNSUPPORTED_CHARS: &[char] = &[
    '^', '$', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '\\',
];

/// How a route's path pattern is compared against the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Only an identical path matches.
    Exact,
    /// An identical path, or any path starting with the pattern.
    #[default]
    Prefix,
}

/// Reasons a path pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("path pattern is empty")]
    Empty,

    #[error("path pattern `{0}` must start with '/'")]
    MissingLeadingSlash(String),

    #[error("path pattern `{pattern}` contains unsupported character `{found}`")]
    UnsupportedSyntax { pattern: String, found: char },
}

/// A compiled path pattern tagged with its match kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatcher {
    kind: MatchKind,
    pattern: String,
}

impl PathMatcher {
    /// Validate `pattern` and build a matcher for it.
    pub fn compile(kind: MatchKind, pattern: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = pattern.into();

        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(pattern));
        }
        if let Some(found) = pattern.chars().find(|c| UNSUPPORTED_CHARS.contains(c)) {
            return Err(PatternError::UnsupportedSyntax { pattern, found });
        }

        Ok(Self { kind, pattern })
    }

    /// Exact or prefix.
    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    /// The pattern as configured.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True if `path` is identical to the pattern.
    pub fn matches_exact(&self, path: &str) -> bool {
        self.pattern == path
    }

    /// True if this is a prefix matcher and `path` starts with the pattern.
    pub fn matches_prefix(&self, path: &str) -> bool {
        self.kind == MatchKind::Prefix && path.starts_with(&self.pattern)
    }
}
