// ABOUTME: Host capability values: container runtime, GPU vendor, display and audio servers.
// ABOUTME: Each axis has an explicit None variant so detection never yields a missing value.

use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Error parsing a host value from its string form.
#[derive(Debug, thiserror::Error)]
#[error("unknown {axis} value: '{value}' (expected one of: {expected})")]
pub struct ParseHostValueError {
    pub axis: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Command-line flavour of a runtime. Podman and Docker differ in GPU and
/// user-namespace flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFlavor {
    Podman,
    Docker,
}

/// The container runtime binary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Runtime {
    Podman,
    Docker,
    /// Explicit path to a runtime binary.
    Path(PathBuf),
    #[default]
    None,
}

impl Runtime {
    /// Program name or path used to invoke this runtime.
    pub fn program(&self) -> &str {
        match self {
            Runtime::Podman => "podman",
            Runtime::Docker => "docker",
            Runtime::Path(path) => path.to_str().unwrap_or("none"),
            Runtime::None => "none",
        }
    }

    /// Flag dialect spoken by this runtime. Explicit paths are treated as
    /// podman only when the file name says so.
    pub fn flavor(&self) -> RuntimeFlavor {
        match self {
            Runtime::Podman => RuntimeFlavor::Podman,
            Runtime::Path(path) if file_name_contains(path, "podman") => RuntimeFlavor::Podman,
            _ => RuntimeFlavor::Docker,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Runtime::None)
    }
}

fn file_name_contains(path: &Path, needle: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(needle))
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Path(path) => write!(f, "{}", path.display()),
            other => write!(f, "{}", other.program()),
        }
    }
}

impl FromStr for Runtime {
    type Err = ParseHostValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "podman" => Ok(Runtime::Podman),
            "docker" => Ok(Runtime::Docker),
            "none" => Ok(Runtime::None),
            s if s.contains('/') => Ok(Runtime::Path(PathBuf::from(s))),
            s => Err(ParseHostValueError {
                axis: "runtime",
                value: s.to_string(),
                expected: "podman, docker, none, or a path to a runtime binary",
            }),
        }
    }
}

/// GPU vendor whose devices are passed to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    #[default]
    None,
}

impl fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuVendor::Nvidia => write!(f, "nvidia"),
            GpuVendor::Amd => write!(f, "amd"),
            GpuVendor::None => write!(f, "none"),
        }
    }
}

impl FromStr for GpuVendor {
    type Err = ParseHostValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "nvidia" => Ok(GpuVendor::Nvidia),
            "amd" => Ok(GpuVendor::Amd),
            "none" => Ok(GpuVendor::None),
            s => Err(ParseHostValueError {
                axis: "gpu",
                value: s.to_string(),
                expected: "nvidia, amd, none",
            }),
        }
    }
}

/// Display protocol of the host session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayServer {
    X11,
    Wayland,
    #[default]
    None,
}

impl fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayServer::X11 => write!(f, "x11"),
            DisplayServer::Wayland => write!(f, "wayland"),
            DisplayServer::None => write!(f, "none"),
        }
    }
}

impl FromStr for DisplayServer {
    type Err = ParseHostValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "x11" => Ok(DisplayServer::X11),
            "wayland" => Ok(DisplayServer::Wayland),
            "none" => Ok(DisplayServer::None),
            s => Err(ParseHostValueError {
                axis: "display",
                value: s.to_string(),
                expected: "x11, wayland, none",
            }),
        }
    }
}

/// Sound server reachable from the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioServer {
    PulseAudio,
    #[default]
    None,
}

impl fmt::Display for AudioServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioServer::PulseAudio => write!(f, "pulseaudio"),
            AudioServer::None => write!(f, "none"),
        }
    }
}

impl FromStr for AudioServer {
    type Err = ParseHostValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pulseaudio" => Ok(AudioServer::PulseAudio),
            "none" => Ok(AudioServer::None),
            s => Err(ParseHostValueError {
                axis: "audio",
                value: s.to_string(),
                expected: "pulseaudio, none",
            }),
        }
    }
}

// All four axes serialize as their display string and parse through FromStr.
macro_rules! string_serde {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(self)
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let s = String::deserialize(deserializer)?;
                    s.parse().map_err(de::Error::custom)
                }
            }
        )*
    };
}

string_serde!(Runtime, GpuVendor, DisplayServer, AudioServer);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_parses_names_and_paths() {
        assert_eq!("podman".parse::<Runtime>().unwrap(), Runtime::Podman);
        assert_eq!("docker".parse::<Runtime>().unwrap(), Runtime::Docker);
        assert_eq!("none".parse::<Runtime>().unwrap(), Runtime::None);
        assert_eq!(
            "/opt/bin/podman".parse::<Runtime>().unwrap(),
            Runtime::Path(PathBuf::from("/opt/bin/podman"))
        );
        assert!("containerd".parse::<Runtime>().is_err());
    }

    #[test]
    fn runtime_path_flavor_follows_file_name() {
        let podman = Runtime::Path(PathBuf::from("/usr/local/bin/podman-remote"));
        let other = Runtime::Path(PathBuf::from("/usr/local/bin/nerdctl"));
        assert_eq!(podman.flavor(), RuntimeFlavor::Podman);
        assert_eq!(other.flavor(), RuntimeFlavor::Docker);
    }

    #[test]
    fn parse_error_names_axis() {
        let err = "intel".parse::<GpuVendor>().unwrap_err();
        assert!(err.to_string().contains("gpu"));
        assert!(err.to_string().contains("intel"));
    }

    #[test]
    fn values_display_lowercase() {
        assert_eq!(DisplayServer::Wayland.to_string(), "wayland");
        assert_eq!(AudioServer::PulseAudio.to_string(), "pulseaudio");
        assert_eq!(GpuVendor::None.to_string(), "none");
    }
}
