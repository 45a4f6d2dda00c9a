// ABOUTME: Host capability detection for runtime, GPU, display and audio.
// ABOUTME: Probes never fail; each axis degrades to its explicit None value.

use super::paths::{HostPaths, HostSockets, env_non_empty};
use super::types::{AudioServer, DisplayServer, GpuVendor, Runtime};
use serde::Serialize;
use std::path::PathBuf;

/// Detected host capabilities. Every axis holds an explicit value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub runtime: Runtime,
    pub gpu: GpuVendor,
    pub display: DisplayServer,
    pub audio: AudioServer,
    pub sockets: HostSockets,
}

/// Detection results enriched with operator-facing diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionDetails {
    pub runtime: RuntimeDetail,
    pub gpu: GpuDetail,
    pub display: DisplayDetail,
    pub audio: AudioDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeDetail {
    pub value: Runtime,
    /// Resolved binary path, or `not found`.
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GpuDetail {
    pub value: GpuVendor,
    pub details: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayDetail {
    pub value: DisplayServer,
    /// Raw `$XDG_SESSION_TYPE`, or `unknown`.
    pub session_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioDetail {
    pub value: AudioServer,
    pub details: String,
}

/// Detect host capabilities using the real system paths.
pub fn detect_system() -> DetectionResult {
    Detector::default().detect()
}

/// Detect host capabilities with diagnostic strings, using the real system paths.
pub fn get_detection_details() -> DetectionDetails {
    Detector::default().details()
}

/// Runs the host probes against a set of [`HostPaths`].
#[derive(Debug, Clone, Default)]
pub struct Detector {
    paths: HostPaths,
}

impl Detector {
    pub fn new(paths: HostPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &HostPaths {
        &self.paths
    }

    pub fn detect(&self) -> DetectionResult {
        let result = DetectionResult {
            runtime: self.runtime().0,
            gpu: self.gpu(),
            display: detect_display(),
            audio: self.audio().0,
            sockets: self.paths.discover_sockets(),
        };
        tracing::debug!(
            runtime = %result.runtime,
            gpu = %result.gpu,
            display = %result.display,
            audio = %result.audio,
            "host detection complete"
        );
        result
    }

    pub fn details(&self) -> DetectionDetails {
        let (runtime, runtime_path) = self.runtime();
        let gpu = self.gpu();
        let (audio, audio_socket) = self.audio();

        DetectionDetails {
            runtime: RuntimeDetail {
                value: runtime,
                path: runtime_path
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "not found".to_string()),
            },
            gpu: GpuDetail {
                value: gpu,
                details: self.gpu_description(gpu),
            },
            display: DisplayDetail {
                value: detect_display(),
                session_type: env_non_empty("XDG_SESSION_TYPE")
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            audio: AudioDetail {
                value: audio,
                details: self.audio_description(audio_socket),
            },
        }
    }

    /// Podman first, then Docker.
    fn runtime(&self) -> (Runtime, Option<PathBuf>) {
        for (runtime, binary) in [(Runtime::Podman, "podman"), (Runtime::Docker, "docker")] {
            match which::which(binary) {
                Ok(path) => {
                    tracing::debug!("found {} at {}", binary, path.display());
                    return (runtime, Some(path));
                }
                Err(e) => tracing::debug!("{} not resolvable: {}", binary, e),
            }
        }
        (Runtime::None, None)
    }

    fn gpu(&self) -> GpuVendor {
        if self.paths.nvidia_version.exists()
            || self.paths.nvidia_device.exists()
            || self.paths.kernel_module_loaded("nvidia")
        {
            GpuVendor::Nvidia
        } else if self.paths.kernel_module_loaded("amdgpu") {
            GpuVendor::Amd
        } else {
            GpuVendor::None
        }
    }

    fn gpu_description(&self, gpu: GpuVendor) -> String {
        match gpu {
            GpuVendor::Nvidia => std::fs::read_to_string(&self.paths.nvidia_version)
                .ok()
                .and_then(|s| s.lines().next().map(|l| l.trim().to_string()))
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "NVIDIA GPU (driver version unavailable)".to_string()),
            GpuVendor::Amd => "AMD GPU (amdgpu kernel module)".to_string(),
            GpuVendor::None => "no dedicated GPU detected".to_string(),
        }
    }

    fn audio(&self) -> (AudioServer, Option<PathBuf>) {
        match self.paths.pulse_socket_path() {
            Some(socket) if socket.exists() => (AudioServer::PulseAudio, Some(socket)),
            Some(socket) => {
                tracing::debug!("no sound server socket at {}", socket.display());
                (AudioServer::None, None)
            }
            None => (AudioServer::None, None),
        }
    }

    fn audio_description(&self, socket: Option<PathBuf>) -> String {
        let Some(socket) = socket else {
            return "no sound server socket found".to_string();
        };
        let pipewire = self
            .paths
            .user_runtime_dir()
            .is_some_and(|dir| dir.join("pipewire-0").exists());
        if pipewire {
            format!("PipeWire (pulse compatibility) at {}", socket.display())
        } else {
            format!("PulseAudio at {}", socket.display())
        }
    }
}

/// Session type first, then whichever display variable is set.
fn detect_display() -> DisplayServer {
    match env_non_empty("XDG_SESSION_TYPE").as_deref() {
        Some("wayland") => return DisplayServer::Wayland,
        Some("x11") => return DisplayServer::X11,
        _ => {}
    }
    if env_non_empty("WAYLAND_DISPLAY").is_some() {
        DisplayServer::Wayland
    } else if env_non_empty("DISPLAY").is_some() {
        DisplayServer::X11
    } else {
        DisplayServer::None
    }
}
