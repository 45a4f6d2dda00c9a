// ABOUTME: Config scaffolding for first-time users.
// ABOUTME: Writes a commented config.yaml where empty values mean auto-detection.

use std::path::Path;

use crate::error::{Error, Result};

const TEMPLATE: &str = r#"# craftpod configuration
# Leave values empty (or "auto") to use auto-detection.

# podman, docker, or a path to a runtime binary
runtime: ''
# nvidia, amd, none
gpu: ''
# x11, wayland, none
display: ''
# pulseaudio, none
audio: ''
# Run `xhost +local:` before starting on X11
auto_xhost: true

# launch:
#   image: localhost/craftpod:latest
#   container_name: craftpod
#   ready_pattern: '(?i)launcher\s+(started|ready)'
#   stop_timeout: 10s
#   volumes:
#     - craftpod-data:/home/player/.minecraft
"#;

/// Write the config template to `path`, creating parent directories.
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::AlreadyExists(path.to_path_buf()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, TEMPLATE)?;
    tracing::info!("wrote config template to {}", path.display());

    Ok(())
}
