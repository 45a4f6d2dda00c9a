// ABOUTME: Pure rendering of runtime invocations for up, down and restart.
// ABOUTME: The preview string and the spawned process come from the same Invocation.

use crate::config::ResolvedConfig;
use crate::host::{AudioServer, DisplayServer, GpuVendor, RuntimeFlavor};
use std::fmt;
use std::str::FromStr;

const CONTAINER_X11_DIR: &str = "/tmp/.X11-unix";
const CONTAINER_RUNTIME_DIR: &str = "/tmp";
const CONTAINER_WAYLAND_DISPLAY: &str = "wayland-0";
const CONTAINER_PULSE_SOCKET: &str = "/run/pulse/native";

/// Lifecycle action to render a command for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Run the container; `detached` returns as soon as it is created.
    Up { detached: bool },
    Down,
    Restart,
}

impl Action {
    pub const UP: Action = Action::Up { detached: false };
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Up { .. } => write!(f, "up"),
            Action::Down => write!(f, "down"),
            Action::Restart => write!(f, "restart"),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Action::UP),
            "down" => Ok(Action::Down),
            "restart" => Ok(Action::Restart),
            _ => Err(format!("unknown action: {} (expected up, down, restart)", s)),
        }
    }
}

/// A program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    fn flag(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.arg(flag).arg(value)
    }

    /// A tokio command running exactly this invocation.
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// Quote for a POSIX shell only when needed.
fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | ',' | '+' | '@' | '%')
        });
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Render the runtime invocation for `action`.
pub fn compose(config: &ResolvedConfig, action: Action) -> Invocation {
    let mut inv = Invocation::new(config.runtime.program());
    let name = config.launch.container_name.as_str();

    match action {
        Action::Up { detached } => {
            inv.arg("run").arg("--rm").flag("--name", name);
            if detached {
                inv.arg("-d");
            }
            if config.runtime.flavor() == RuntimeFlavor::Podman {
                inv.arg("--userns=keep-id")
                    .flag("--security-opt", "label=disable");
            }
            display_flags(&mut inv, config);
            audio_flags(&mut inv, config);
            gpu_flags(&mut inv, config);
            for volume in &config.launch.volumes {
                inv.flag("-v", volume.as_str());
            }
            inv.arg(config.launch.image.as_str());
        }
        Action::Down => {
            inv.arg("stop")
                .flag("-t", config.launch.stop_timeout.as_secs().to_string())
                .arg(name);
        }
        Action::Restart => {
            inv.arg("restart").arg(name);
        }
    }

    inv
}

/// The exact command line for `action`, as shown to the user before it runs.
pub fn get_command_preview(config: &ResolvedConfig, action: Action) -> String {
    compose(config, action).to_string()
}

fn display_flags(inv: &mut Invocation, config: &ResolvedConfig) {
    match config.display {
        DisplayServer::X11 => {
            inv.flag("-e", "DISPLAY").flag(
                "-v",
                format!(
                    "{}:{}:rw",
                    config.sockets.x11_socket_dir.display(),
                    CONTAINER_X11_DIR
                ),
            );
        }
        DisplayServer::Wayland => {
            inv.flag("-e", format!("XDG_RUNTIME_DIR={}", CONTAINER_RUNTIME_DIR))
                .flag("-e", format!("WAYLAND_DISPLAY={}", CONTAINER_WAYLAND_DISPLAY));
            if let Some(socket) = &config.sockets.wayland_socket {
                inv.flag(
                    "-v",
                    format!(
                        "{}:{}/{}",
                        socket.display(),
                        CONTAINER_RUNTIME_DIR,
                        CONTAINER_WAYLAND_DISPLAY
                    ),
                );
            }
        }
        DisplayServer::None => {}
    }
}

fn audio_flags(inv: &mut Invocation, config: &ResolvedConfig) {
    if config.audio != AudioServer::PulseAudio {
        return;
    }
    inv.flag("-e", format!("PULSE_SERVER=unix:{}", CONTAINER_PULSE_SOCKET));
    if let Some(socket) = &config.sockets.pulse_socket {
        inv.flag(
            "-v",
            format!("{}:{}", socket.display(), CONTAINER_PULSE_SOCKET),
        );
    }
}

fn gpu_flags(inv: &mut Invocation, config: &ResolvedConfig) {
    match config.gpu {
        GpuVendor::Nvidia => {
            match config.runtime.flavor() {
                RuntimeFlavor::Podman => inv.flag("--device", "nvidia.com/gpu=all"),
                RuntimeFlavor::Docker => inv.flag("--gpus", "all"),
            };
            inv.flag("-e", "NVIDIA_DRIVER_CAPABILITIES=all");
        }
        GpuVendor::Amd => {
            inv.flag("--device", "/dev/dri");
        }
        GpuVendor::None => {}
    }
}
