// ABOUTME: Preflight validation of a resolved config against the live host.
// ABOUTME: Produces blocking and advisory issues with actionable fix hints.

mod report;
mod xhost;

pub use report::{Severity, ValidationIssue, ValidationReport};
pub use xhost::{run_xhost_if_needed, xhost_grant};

use crate::config::ResolvedConfig;
use crate::host::{AudioServer, DisplayServer, GpuVendor, HostPaths, Runtime, env_non_empty};
use std::path::Path;

const NVIDIA_TOOLKIT_BINARIES: [&str; 3] = [
    "nvidia-ctk",
    "nvidia-container-toolkit",
    "nvidia-container-runtime",
];
const NVIDIA_CDI_SPECS: [&str; 2] = ["nvidia.yaml", "nvidia.json"];

/// Validate a resolved config against the real host.
pub fn validate_system(config: &ResolvedConfig) -> ValidationReport {
    Validator::default().validate(config)
}

/// Runs preflight checks against a set of [`HostPaths`].
#[derive(Debug, Clone, Default)]
pub struct Validator {
    paths: HostPaths,
}

impl Validator {
    pub fn new(paths: HostPaths) -> Self {
        Self { paths }
    }

    /// Run every check in a fixed order. Each check contributes at most one
    /// issue.
    pub fn validate(&self, config: &ResolvedConfig) -> ValidationReport {
        let mut report = ValidationReport::default();

        let checks = [
            check_runtime(&config.runtime),
            self.check_gpu(config.gpu),
            self.check_display(config.display),
            self.check_audio(config.audio),
        ];
        for issue in checks.into_iter().flatten() {
            report.push(issue);
        }

        report
    }

    fn check_gpu(&self, gpu: GpuVendor) -> Option<ValidationIssue> {
        match gpu {
            GpuVendor::Nvidia if !self.nvidia_integration_present() => {
                Some(ValidationIssue::blocking(
                    "NVIDIA GPU selected but the NVIDIA Container Toolkit was not found",
                    "Install nvidia-container-toolkit and generate a CDI spec with \
                     `sudo nvidia-ctk cdi generate --output=/etc/cdi/nvidia.yaml`, \
                     or choose gpu: none",
                ))
            }
            GpuVendor::Amd if !self.paths.dri_dir.exists() => Some(ValidationIssue::advisory(
                format!(
                    "AMD GPU selected but {} is missing; rendering will fall back to software",
                    self.paths.dri_dir.display()
                ),
                "Load the amdgpu kernel module and make sure your user is in the video/render groups",
            )),
            _ => None,
        }
    }

    fn nvidia_integration_present(&self) -> bool {
        let toolkit = NVIDIA_TOOLKIT_BINARIES
            .iter()
            .any(|binary| which::which(binary).is_ok());
        let cdi_spec = self.paths.cdi_dirs.iter().any(|dir| {
            NVIDIA_CDI_SPECS
                .iter()
                .any(|spec| dir.join(spec).is_file())
        });
        tracing::debug!(toolkit, cdi_spec, "nvidia container integration probe");
        toolkit || cdi_spec
    }

    fn check_display(&self, display: DisplayServer) -> Option<ValidationIssue> {
        match display {
            DisplayServer::X11 => self.check_x11(),
            DisplayServer::Wayland => self.check_wayland(),
            DisplayServer::None => None,
        }
    }

    fn check_x11(&self) -> Option<ValidationIssue> {
        let Some(display) = env_non_empty("DISPLAY") else {
            return Some(ValidationIssue::blocking(
                "X11 display selected but DISPLAY is not set",
                "Run from a graphical X11 session or export DISPLAY (e.g. `export DISPLAY=:0`)",
            ));
        };

        // Remote displays have no local socket to check.
        let socket = self.paths.x11_socket_for(&display)?;
        if socket.exists() {
            return None;
        }
        Some(ValidationIssue::blocking(
            format!(
                "X11 socket {} for DISPLAY={} not found",
                socket.display(),
                display
            ),
            format!(
                "Make sure the X server is running and exposes its socket under {}",
                self.paths.x11_socket_dir.display()
            ),
        ))
    }

    fn check_wayland(&self) -> Option<ValidationIssue> {
        if env_non_empty("WAYLAND_DISPLAY").is_none() {
            return Some(ValidationIssue::blocking(
                "Wayland display selected but WAYLAND_DISPLAY is not set",
                "Run from a Wayland session or choose display: x11",
            ));
        }
        match self.paths.wayland_socket_path() {
            Some(socket) if socket.exists() => None,
            Some(socket) => Some(ValidationIssue::blocking(
                format!("Wayland socket {} not found", socket.display()),
                "Make sure the compositor is running and XDG_RUNTIME_DIR points at its runtime directory",
            )),
            None => Some(ValidationIssue::blocking(
                "Wayland socket location unknown: XDG_RUNTIME_DIR is not set",
                "Export XDG_RUNTIME_DIR (usually /run/user/$UID)",
            )),
        }
    }

    fn check_audio(&self, audio: AudioServer) -> Option<ValidationIssue> {
        if audio != AudioServer::PulseAudio {
            return None;
        }
        match self.paths.pulse_socket_path() {
            Some(socket) if socket.exists() => None,
            socket => Some(ValidationIssue::advisory(
                match socket {
                    Some(path) => format!(
                        "PulseAudio socket {} not found; the game will have no sound",
                        path.display()
                    ),
                    None => "PulseAudio socket location unknown; the game will have no sound"
                        .to_string(),
                },
                "Start pulseaudio or pipewire-pulse (`systemctl --user start pipewire-pulse`), or choose audio: none",
            )),
        }
    }
}

fn check_runtime(runtime: &Runtime) -> Option<ValidationIssue> {
    if runtime.is_none() {
        return Some(ValidationIssue::blocking(
            "No container runtime found",
            "Install podman (recommended) or docker, e.g. `sudo apt install podman`",
        ));
    }

    let program = runtime.program();
    match which::which(program) {
        Ok(path) => {
            tracing::debug!("runtime {} resolves to {}", runtime, path.display());
            None
        }
        Err(e) => {
            tracing::debug!("runtime {} not usable: {}", runtime, e);
            let binary = Path::new(program)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(program);
            Some(ValidationIssue::blocking(
                format!("Container runtime '{}' not found or not executable", program),
                format!(
                    "Install {binary} (e.g. `sudo apt install {binary}` or `sudo dnf install {binary}`) \
                     or select a different runtime"
                ),
            ))
        }
    }
}
