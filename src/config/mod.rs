// ABOUTME: Configuration types and parsing for config.yaml.
// ABOUTME: Handles YAML load/save, CLI overrides, and resolution against host detection.

mod choice;
mod init;
mod launch;

pub use choice::Choice;
pub use init::init_config;
pub use launch::LaunchSettings;

use crate::error::{Error, Result};
use crate::host::{AudioServer, DetectionResult, DisplayServer, GpuVendor, HostSockets, Runtime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = "craftpod";
pub const CONFIG_FILENAME: &str = "config.yaml";

/// User configuration. Any axis may still be `Auto`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: Choice<Runtime>,

    #[serde(default)]
    pub gpu: Choice<GpuVendor>,

    #[serde(default)]
    pub display: Choice<DisplayServer>,

    #[serde(default)]
    pub audio: Choice<AudioServer>,

    #[serde(default = "default_auto_xhost")]
    pub auto_xhost: bool,

    #[serde(default)]
    pub launch: LaunchSettings,
}

fn default_auto_xhost() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            runtime: Choice::Auto,
            gpu: Choice::Auto,
            display: Choice::Auto,
            audio: Choice::Auto,
            auto_xhost: default_auto_xhost(),
            launch: LaunchSettings::default(),
        }
    }
}

/// Per-invocation overrides, typically from command-line flags.
/// `None` leaves the configured value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub runtime: Option<Choice<Runtime>>,
    pub gpu: Option<Choice<GpuVendor>>,
    pub display: Option<Choice<DisplayServer>>,
    pub audio: Option<Choice<AudioServer>>,
    pub auto_xhost: Option<bool>,
}

/// A configuration with every axis decided. Composition and lifecycle only
/// accept this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub runtime: Runtime,
    pub gpu: GpuVendor,
    pub display: DisplayServer,
    pub audio: AudioServer,
    pub auto_xhost: bool,
    pub sockets: HostSockets,
    pub launch: LaunchSettings,
}

impl ResolvedConfig {
    /// Resolved config with default sockets and launch settings.
    pub fn new(runtime: Runtime, gpu: GpuVendor, display: DisplayServer, audio: AudioServer) -> Self {
        ResolvedConfig {
            runtime,
            gpu,
            display,
            audio,
            auto_xhost: default_auto_xhost(),
            sockets: HostSockets::default(),
            launch: LaunchSettings::default(),
        }
    }

    pub fn with_sockets(mut self, sockets: HostSockets) -> Self {
        self.sockets = sockets;
        self
    }

    pub fn with_launch(mut self, launch: LaunchSettings) -> Self {
        self.launch = launch;
        self
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty or comment-only file is a valid all-auto config.
        if yaml.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
            return Ok(Config::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load `path` if it exists, otherwise fall back to an all-auto config.
    pub fn discover(path: &Path) -> Result<Self> {
        if path.exists() {
            tracing::debug!("loading config from {}", path.display());
            Self::load(path)
        } else {
            tracing::debug!("no config at {}, using auto-detection", path.display());
            Ok(Config::default())
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::from)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(runtime) = overrides.runtime {
            self.runtime = runtime;
        }
        if let Some(gpu) = overrides.gpu {
            self.gpu = gpu;
        }
        if let Some(display) = overrides.display {
            self.display = display;
        }
        if let Some(audio) = overrides.audio {
            self.audio = audio;
        }
        if let Some(auto_xhost) = overrides.auto_xhost {
            self.auto_xhost = auto_xhost;
        }
        self
    }

    /// Replace every `Auto` with the detected value.
    pub fn resolve(&self, detected: &DetectionResult) -> ResolvedConfig {
        ResolvedConfig {
            runtime: self.runtime.clone().resolve(detected.runtime.clone()),
            gpu: self.gpu.clone().resolve(detected.gpu),
            display: self.display.clone().resolve(detected.display),
            audio: self.audio.clone().resolve(detected.audio),
            auto_xhost: self.auto_xhost,
            sockets: detected.sockets.clone(),
            launch: self.launch.clone(),
        }
    }
}

/// Default config file location: `<XDG config dir>/craftpod/config.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
        .ok_or(Error::NoConfigDir)
}
