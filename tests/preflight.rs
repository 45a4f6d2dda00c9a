// ABOUTME: Integration tests for preflight validation.
// ABOUTME: Checks blocking and advisory issues against a fake host root and PATH.

mod support;

use craftpod::config::ResolvedConfig;
use craftpod::host::*;
use craftpod::preflight::{Severity, Validator};
use std::fs;
use std::path::{Path, PathBuf};
use support::write_script;

/// A fake host: a filesystem root plus a bin directory used as PATH.
struct Host {
    root: tempfile::TempDir,
    bin: PathBuf,
}

impl Host {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let bin = root.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        Self { root, bin }
    }

    fn paths(&self) -> HostPaths {
        HostPaths::rooted_at(self.root.path())
    }

    fn install(&self, binary: &str) -> PathBuf {
        write_script(&self.bin, binary, "exit 0\n")
    }

    fn touch(&self, path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    /// Validate with only the fake bin directory on PATH.
    fn validate(
        &self,
        config: &ResolvedConfig,
        vars: &[(&str, Option<&str>)],
    ) -> (bool, Vec<craftpod::preflight::ValidationIssue>) {
        let path = self.bin.to_str().unwrap();
        let mut env = vec![
            ("PATH", Some(path)),
            ("DISPLAY", None),
            ("WAYLAND_DISPLAY", None),
            ("PULSE_SERVER", None),
        ];
        for (key, value) in vars {
            match env.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = *value,
                None => env.push((*key, *value)),
            }
        }
        temp_env::with_vars(env, || Validator::new(self.paths()).validate(config).into_parts())
    }
}

fn config(runtime: Runtime, gpu: GpuVendor, display: DisplayServer, audio: AudioServer) -> ResolvedConfig {
    ResolvedConfig::new(runtime, gpu, display, audio)
}

mod runtime {
    use super::*;

    #[test]
    fn missing_runtime_path_is_the_only_blocking_issue() {
        let host = Host::new();
        let cfg = config(
            Runtime::Path(PathBuf::from("/nonexistent/podman")),
            GpuVendor::None,
            DisplayServer::None,
            AudioServer::None,
        );

        let (valid, issues) = host.validate(&cfg, &[]);

        assert!(!valid);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Blocking);
        assert!(issues[0].message.contains("/nonexistent/podman"));
        let hint = issues[0].fix_hint.as_deref().unwrap();
        assert!(hint.contains("podman"));
    }

    #[test]
    fn no_runtime_is_blocking() {
        let host = Host::new();
        let cfg = config(Runtime::None, GpuVendor::None, DisplayServer::None, AudioServer::None);

        let (valid, issues) = host.validate(&cfg, &[]);

        assert!(!valid);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_blocking());
    }

    #[test]
    fn installed_runtime_passes() {
        let host = Host::new();
        host.install("docker");
        let cfg = config(Runtime::Docker, GpuVendor::None, DisplayServer::None, AudioServer::None);

        assert_eq!(host.validate(&cfg, &[]), (true, vec![]));
    }
}

mod gpu {
    use super::*;

    #[test]
    fn nvidia_without_toolkit_is_blocking() {
        let host = Host::new();
        host.install("podman");
        let cfg = config(Runtime::Podman, GpuVendor::Nvidia, DisplayServer::None, AudioServer::None);

        let (valid, issues) = host.validate(&cfg, &[]);

        assert!(!valid);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_blocking());
        assert!(issues[0].message.contains("NVIDIA"));
    }

    #[test]
    fn nvidia_with_toolkit_binary_passes() {
        let host = Host::new();
        host.install("podman");
        host.install("nvidia-ctk");
        let cfg = config(Runtime::Podman, GpuVendor::Nvidia, DisplayServer::None, AudioServer::None);

        assert_eq!(host.validate(&cfg, &[]), (true, vec![]));
    }

    #[test]
    fn nvidia_with_cdi_spec_passes() {
        let host = Host::new();
        host.install("podman");
        let cdi = host.paths().cdi_dirs[0].join("nvidia.yaml");
        host.touch(&cdi);
        let cfg = config(Runtime::Podman, GpuVendor::Nvidia, DisplayServer::None, AudioServer::None);

        assert_eq!(host.validate(&cfg, &[]), (true, vec![]));
    }

    #[test]
    fn amd_without_dri_is_advisory() {
        let host = Host::new();
        host.install("podman");
        let cfg = config(Runtime::Podman, GpuVendor::Amd, DisplayServer::None, AudioServer::None);

        let (valid, issues) = host.validate(&cfg, &[]);

        assert!(valid);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Advisory);
    }

    #[test]
    fn no_gpu_has_no_gpu_issue() {
        let host = Host::new();
        host.install("podman");
        let cfg = config(Runtime::Podman, GpuVendor::None, DisplayServer::None, AudioServer::None);

        assert!(host.validate(&cfg, &[]).1.is_empty());
    }
}

mod display {
    use super::*;

    #[test]
    fn x11_without_display_is_blocking() {
        let host = Host::new();
        host.install("podman");
        let cfg = config(Runtime::Podman, GpuVendor::None, DisplayServer::X11, AudioServer::None);

        let (valid, issues) = host.validate(&cfg, &[]);

        assert!(!valid);
        assert!(issues[0].message.contains("DISPLAY"));
    }

    #[test]
    fn x11_missing_socket_is_blocking() {
        let host = Host::new();
        host.install("podman");
        let cfg = config(Runtime::Podman, GpuVendor::None, DisplayServer::X11, AudioServer::None);

        let (valid, issues) = host.validate(&cfg, &[("DISPLAY", Some(":3"))]);

        assert!(!valid);
        assert!(issues[0].message.contains("X3"));
    }

    #[test]
    fn x11_remote_display_skips_socket_check() {
        let host = Host::new();
        host.install("podman");
        let cfg = config(Runtime::Podman, GpuVendor::None, DisplayServer::X11, AudioServer::None);

        assert_eq!(
            host.validate(&cfg, &[("DISPLAY", Some("workstation:0"))]),
            (true, vec![])
        );
    }

    #[test]
    fn wayland_without_socket_is_blocking() {
        let host = Host::new();
        host.install("podman");
        let cfg = config(Runtime::Podman, GpuVendor::None, DisplayServer::Wayland, AudioServer::None);

        let (valid, issues) = host.validate(&cfg, &[("WAYLAND_DISPLAY", Some("wayland-0"))]);

        assert!(!valid);
        assert!(issues[0].message.contains("wayland-0"));
    }

    #[test]
    fn wayland_with_socket_passes() {
        let host = Host::new();
        host.install("podman");
        let socket = host.paths().user_runtime_dir().unwrap().join("wayland-0");
        host.touch(&socket);
        let cfg = config(Runtime::Podman, GpuVendor::None, DisplayServer::Wayland, AudioServer::None);

        assert_eq!(
            host.validate(&cfg, &[("WAYLAND_DISPLAY", Some("wayland-0"))]),
            (true, vec![])
        );
    }
}

mod audio {
    use super::*;

    #[test]
    fn missing_pulse_socket_is_advisory() {
        let host = Host::new();
        host.install("podman");
        let cfg = config(Runtime::Podman, GpuVendor::None, DisplayServer::None, AudioServer::PulseAudio);

        let (valid, issues) = host.validate(&cfg, &[]);

        assert!(valid);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Advisory);
        assert!(issues[0].fix_hint.as_deref().is_some_and(|h| !h.is_empty()));
    }
}

#[test]
fn fully_provisioned_x11_host_is_valid() {
    let host = Host::new();
    host.install("podman");
    let paths = host.paths();
    host.touch(&paths.x11_socket_dir.join("X0"));
    host.touch(&paths.user_runtime_dir().unwrap().join("pulse/native"));
    let cfg = config(Runtime::Podman, GpuVendor::None, DisplayServer::X11, AudioServer::PulseAudio);

    assert_eq!(host.validate(&cfg, &[("DISPLAY", Some(":0"))]), (true, vec![]));
}

#[test]
fn issues_follow_check_order() {
    let host = Host::new();
    let cfg = config(Runtime::None, GpuVendor::Nvidia, DisplayServer::X11, AudioServer::PulseAudio);

    let (valid, issues) = host.validate(&cfg, &[]);

    assert!(!valid);
    let severities: Vec<Severity> = issues.iter().map(|i| i.severity).collect();
    assert_eq!(
        severities,
        vec![
            Severity::Blocking,
            Severity::Blocking,
            Severity::Blocking,
            Severity::Advisory,
        ]
    );
    assert!(issues[0].message.contains("runtime"));
    assert!(issues[1].message.contains("NVIDIA"));
    assert!(issues[2].message.contains("DISPLAY"));
}
