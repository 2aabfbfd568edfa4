// hoist-common/src/version.rs
//! The opaque version token compared between the local install and the remote.
use std::fmt;

/// Placeholder used whenever no real version is known.
pub const SENTINEL_VERSION: &str = "0.0.0";

/// An opaque version token.
///
/// Tokens are compared for equality only; "1.10" and "1.9" are simply
/// different, never ordered. Surrounding whitespace is not part of the token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    /// Builds a token from raw text (file contents, HTTP body). Blank text
    /// yields the sentinel.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::sentinel()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn sentinel() -> Self {
        Self(SENTINEL_VERSION.to_string())
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL_VERSION
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
