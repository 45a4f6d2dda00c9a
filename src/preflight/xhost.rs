// ABOUTME: Grants containers local access to the host X server via xhost.
// ABOUTME: Failures are logged and reported as false, never raised.

use crate::config::ResolvedConfig;
use crate::host::DisplayServer;
use std::process::{Command, Stdio};

/// Run `xhost +local:` when the config targets X11 with `auto_xhost` set.
///
/// Returns `true` when no grant was needed or the grant succeeded. Granting
/// twice is harmless, so callers may run this before every start.
pub fn run_xhost_if_needed(config: &ResolvedConfig) -> bool {
    if config.display != DisplayServer::X11 || !config.auto_xhost {
        return true;
    }
    xhost_grant("xhost")
}

/// Run `<program> +local:` and report whether it exited successfully.
pub fn xhost_grant(program: &str) -> bool {
    let output = Command::new(program)
        .arg("+local:")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    match output {
        Ok(output) if output.status.success() => {
            tracing::info!("granted local X11 access");
            true
        }
        Ok(output) => {
            tracing::warn!(
                "xhost exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            false
        }
        Err(e) => {
            tracing::warn!("failed to run {}: {}", program, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AudioServer, GpuVendor, Runtime};

    #[test]
    fn skipped_for_wayland() {
        let config = ResolvedConfig::new(
            Runtime::Podman,
            GpuVendor::None,
            DisplayServer::Wayland,
            AudioServer::None,
        );
        assert!(run_xhost_if_needed(&config));
    }

    #[test]
    fn skipped_when_auto_xhost_disabled() {
        let mut config = ResolvedConfig::new(
            Runtime::Podman,
            GpuVendor::None,
            DisplayServer::X11,
            AudioServer::None,
        );
        config.auto_xhost = false;
        assert!(run_xhost_if_needed(&config));
    }

    #[test]
    fn missing_xhost_binary_is_not_fatal() {
        assert!(!xhost_grant("/nonexistent/craftpod-xhost"));
    }
}
