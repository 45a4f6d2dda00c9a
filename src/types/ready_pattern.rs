// ABOUTME: Compiled regex that marks the launcher as interactive in container output.
// ABOUTME: Validated at config load so a bad pattern never reaches the lifecycle manager.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Default marker: TLauncher and the vanilla launcher both log a line like
/// "Launcher started" / "Launcher ready" once the window is up.
pub const DEFAULT_READY_PATTERN: &str = r"(?i)launcher\s+(started|ready)";

#[derive(Debug, Error)]
#[error("invalid ready pattern '{pattern}': {source}")]
pub struct ReadyPatternError {
    pattern: String,
    source: regex::Error,
}

#[derive(Debug, Clone)]
pub struct ReadyPattern(Regex);

impl ReadyPattern {
    pub fn new(pattern: &str) -> Result<Self, ReadyPatternError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|source| ReadyPatternError {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.0.is_match(line)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for ReadyPattern {
    fn default() -> Self {
        // The default pattern is a literal known to compile.
        Self(Regex::new(DEFAULT_READY_PATTERN).expect("default ready pattern is valid"))
    }
}

impl PartialEq for ReadyPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ReadyPattern {}

impl fmt::Display for ReadyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}

impl Serialize for ReadyPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReadyPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ReadyPattern::new(&s).map_err(serde::de::Error::custom)
    }
}
