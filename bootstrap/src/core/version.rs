//! Semantic version parsing and ordering for runtime discovery.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `major.minor[.patch]`, first match wins.
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").unwrap());

/// A `major.minor.patch` version, ordered lexicographically by component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemanticVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Extract the first version-looking token from free-form tool output
    /// (e.g. `Python 3.12.1`). A missing patch component reads as `0`.
    pub fn find_in(text: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(text)?;
        let major = caps.get(1)?.as_str().parse().ok()?;
        let minor = caps.get(2)?.as_str().parse().ok()?;
        let patch = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version '{0}' (expected MAJOR.MINOR[.PATCH])")]
pub struct ParseVersionError(String);

impl FromStr for SemanticVersion {
    type Err = ParseVersionError;

    /// Strict parse: the whole string must be a version.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = Self::find_in(trimmed).ok_or_else(|| ParseVersionError(s.to_string()))?;
        let matched_len = VERSION_RE
            .find(trimmed)
            .map(|m| (m.start(), m.end()))
            .unwrap_or_default();
        if matched_len != (0, trimmed.len()) {
            return Err(ParseVersionError(s.to_string()));
        }
        Ok(parsed)
    }
}

impl TryFrom<String> for SemanticVersion {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SemanticVersion> for String {
    fn from(value: SemanticVersion) -> Self {
        value.to_string()
    }
}
