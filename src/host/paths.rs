// ABOUTME: Filesystem and environment probe locations used by detection and preflight.
// ABOUTME: Resolves display and sound-server sockets without touching process state.

use std::path::{Path, PathBuf};

const NVIDIA_VERSION: &str = "/proc/driver/nvidia/version";
const NVIDIA_DEVICE: &str = "/dev/nvidia0";
const SYS_MODULE: &str = "/sys/module";
const DRI_DIR: &str = "/dev/dri";
const X11_SOCKET_DIR: &str = "/tmp/.X11-unix";
const CDI_DIRS: [&str; 2] = ["/etc/cdi", "/var/run/cdi"];

/// Where the host probes look. Defaults point at the real system; tests swap
/// in a temporary tree.
#[derive(Debug, Clone)]
pub struct HostPaths {
    pub nvidia_version: PathBuf,
    pub nvidia_device: PathBuf,
    pub sys_module: PathBuf,
    pub dri_dir: PathBuf,
    pub x11_socket_dir: PathBuf,
    pub cdi_dirs: Vec<PathBuf>,
    /// Overrides `$XDG_RUNTIME_DIR` when set.
    pub runtime_dir: Option<PathBuf>,
    /// Uid for the `/run/user/<uid>` fallback; `None` reads the process uid.
    pub uid: Option<u32>,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            nvidia_version: PathBuf::from(NVIDIA_VERSION),
            nvidia_device: PathBuf::from(NVIDIA_DEVICE),
            sys_module: PathBuf::from(SYS_MODULE),
            dri_dir: PathBuf::from(DRI_DIR),
            x11_socket_dir: PathBuf::from(X11_SOCKET_DIR),
            cdi_dirs: CDI_DIRS.iter().map(PathBuf::from).collect(),
            runtime_dir: None,
            uid: None,
        }
    }
}

impl HostPaths {
    /// Build paths rooted at `root`, mirroring the system layout beneath it.
    pub fn rooted_at(root: &Path) -> Self {
        let under = |p: &str| root.join(p.trim_start_matches('/'));
        Self {
            nvidia_version: under(NVIDIA_VERSION),
            nvidia_device: under(NVIDIA_DEVICE),
            sys_module: under(SYS_MODULE),
            dri_dir: under(DRI_DIR),
            x11_socket_dir: under(X11_SOCKET_DIR),
            cdi_dirs: CDI_DIRS.iter().map(|d| under(d)).collect(),
            runtime_dir: Some(root.join("run/user/1000")),
            uid: Some(1000),
        }
    }

    /// Per-user runtime directory: explicit override, then `$XDG_RUNTIME_DIR`,
    /// then `/run/user/<uid>`.
    pub fn user_runtime_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.runtime_dir {
            return Some(dir.clone());
        }
        if let Some(dir) = std::env::var_os("XDG_RUNTIME_DIR").filter(|d| !d.is_empty()) {
            return Some(PathBuf::from(dir));
        }
        self.uid
            .or_else(process_uid)
            .map(|uid| PathBuf::from(format!("/run/user/{uid}")))
    }

    pub fn kernel_module_loaded(&self, name: &str) -> bool {
        self.sys_module.join(name).exists()
    }

    /// Location of the Wayland compositor socket named by `$WAYLAND_DISPLAY`,
    /// whether or not it exists.
    pub fn wayland_socket_path(&self) -> Option<PathBuf> {
        let name = env_non_empty("WAYLAND_DISPLAY")?;
        let path = PathBuf::from(&name);
        if path.is_absolute() {
            return Some(path);
        }
        self.user_runtime_dir().map(|dir| dir.join(name))
    }

    /// Location of the PulseAudio (or pipewire-pulse) native socket, whether
    /// or not it exists. `$PULSE_SERVER` wins when it names a unix socket.
    pub fn pulse_socket_path(&self) -> Option<PathBuf> {
        if let Some(server) = env_non_empty("PULSE_SERVER")
            && let Some(path) = server.strip_prefix("unix:")
        {
            return Some(PathBuf::from(path));
        }
        self.user_runtime_dir()
            .map(|dir| dir.join("pulse").join("native"))
    }

    /// Local X11 socket for a display string such as `:0` or `:1.0`.
    /// Returns `None` for remote displays (`host:0`), which have no local socket.
    pub fn x11_socket_for(&self, display: &str) -> Option<PathBuf> {
        let number = display.strip_prefix(':')?;
        let number = number.split('.').next().unwrap_or(number);
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(self.x11_socket_dir.join(format!("X{}", number)))
    }

    /// Existing sockets the container needs bound in.
    pub fn discover_sockets(&self) -> HostSockets {
        HostSockets {
            x11_socket_dir: self.x11_socket_dir.clone(),
            wayland_socket: self.wayland_socket_path().filter(|p| p.exists()),
            pulse_socket: self.pulse_socket_path().filter(|p| p.exists()),
        }
    }
}

/// Host sockets bound into the container. Captured once at detection time so
/// command composition never reads the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSockets {
    pub x11_socket_dir: PathBuf,
    pub wayland_socket: Option<PathBuf>,
    pub pulse_socket: Option<PathBuf>,
}

impl Default for HostSockets {
    fn default() -> Self {
        Self {
            x11_socket_dir: PathBuf::from(X11_SOCKET_DIR),
            wayland_socket: None,
            pulse_socket: None,
        }
    }
}

pub(crate) fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Real uid of this process from `/proc/self/status`, else `$UID`.
fn process_uid() -> Option<u32> {
    let from_proc = std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status
                .lines()
                .find_map(|line| line.strip_prefix("Uid:"))
                .and_then(|ids| ids.split_whitespace().next())
                .and_then(|uid| uid.parse().ok())
        });
    from_proc.or_else(|| env_non_empty("UID").and_then(|uid| uid.parse().ok()))
}
