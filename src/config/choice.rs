// ABOUTME: Two-case configuration value: Auto (use detection) or an explicit setting.
// ABOUTME: Accepts "auto", "" or a missing key as Auto when parsing YAML.

use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const AUTO: &str = "auto";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Choice<T> {
    #[default]
    Auto,
    Explicit(T),
}

impl<T> Choice<T> {
    /// Resolve against the detected value. This is the only place `Auto` is
    /// interpreted.
    pub fn resolve(self, detected: T) -> T {
        match self {
            Choice::Auto => detected,
            Choice::Explicit(value) => value,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Choice::Auto)
    }
}

impl<T: FromStr> FromStr for Choice<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(AUTO) {
            return Ok(Choice::Auto);
        }
        s.parse().map(Choice::Explicit)
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Auto => write!(f, "{AUTO}"),
            Choice::Explicit(value) => write!(f, "{value}"),
        }
    }
}

impl<T: fmt::Display> Serialize for Choice<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T> Deserialize<'de> for Choice<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Choice::Auto),
            Some(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::GpuVendor;

    #[test]
    fn empty_and_auto_parse_as_auto() {
        assert_eq!("".parse::<Choice<GpuVendor>>().unwrap(), Choice::Auto);
        assert_eq!("auto".parse::<Choice<GpuVendor>>().unwrap(), Choice::Auto);
        assert_eq!("AUTO".parse::<Choice<GpuVendor>>().unwrap(), Choice::Auto);
    }

    #[test]
    fn explicit_value_overrides_detection() {
        let choice: Choice<GpuVendor> = "amd".parse().unwrap();
        assert_eq!(choice.resolve(GpuVendor::Nvidia), GpuVendor::Amd);
    }

    #[test]
    fn auto_takes_detected_value() {
        assert_eq!(
            Choice::<GpuVendor>::Auto.resolve(GpuVendor::Nvidia),
            GpuVendor::Nvidia
        );
    }

    #[test]
    fn invalid_value_is_an_error() {
        assert!("matrox".parse::<Choice<GpuVendor>>().is_err());
    }
}
