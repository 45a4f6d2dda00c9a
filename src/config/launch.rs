// ABOUTME: Container launch settings: image, name, ready marker, stop timeout, volumes.
// ABOUTME: Every field has a default so a bare config file stays valid.

use crate::types::{ContainerName, ReadyPattern};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSettings {
    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default)]
    pub container_name: ContainerName,

    /// Regex matched against each output line; the first match means the
    /// launcher window is up.
    #[serde(default)]
    pub ready_pattern: ReadyPattern,

    /// Grace period for `stop` before the session is killed.
    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    #[serde(default = "default_volumes")]
    pub volumes: Vec<String>,
}

fn default_image() -> String {
    "localhost/craftpod:latest".to_string()
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_volumes() -> Vec<String> {
    vec!["craftpod-data:/home/player/.minecraft".to_string()]
}

impl Default for LaunchSettings {
    fn default() -> Self {
        LaunchSettings {
            image: default_image(),
            container_name: ContainerName::default(),
            ready_pattern: ReadyPattern::default(),
            stop_timeout: default_stop_timeout(),
            volumes: default_volumes(),
        }
    }
}
