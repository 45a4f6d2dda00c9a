// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands, global flags, and per-run config overrides.

use clap::{Args, Parser, Subcommand};
use craftpod::compose::Action;
use craftpod::config::{Choice, ConfigOverrides};
use craftpod::host::{AudioServer, DisplayServer, GpuVendor, Runtime};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "craftpod")]
#[command(about = "Run the containerized Minecraft launcher with host GPU, display and audio")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/craftpod/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print container output and final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Overrides for a single run; `auto` forces detection.
#[derive(Args)]
pub struct OverrideArgs {
    /// podman, docker, auto, or a path to a runtime binary
    #[arg(long, global = true)]
    pub runtime: Option<Choice<Runtime>>,

    /// nvidia, amd, none, auto
    #[arg(long, global = true)]
    pub gpu: Option<Choice<GpuVendor>>,

    /// x11, wayland, none, auto
    #[arg(long, global = true)]
    pub display: Option<Choice<DisplayServer>>,

    /// pulseaudio, none, auto
    #[arg(long, global = true)]
    pub audio: Option<Choice<AudioServer>>,

    /// Do not run `xhost +local:` before starting
    #[arg(long, global = true)]
    pub no_xhost: bool,
}

impl OverrideArgs {
    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            runtime: self.runtime,
            gpu: self.gpu,
            display: self.display,
            audio: self.audio,
            auto_xhost: self.no_xhost.then_some(false),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a config file with every value set to auto-detect
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show detected host capabilities
    Detect,

    /// Run diagnostics and validate the system
    Doctor,

    /// Print the runtime command without running it
    Preview {
        /// up, down, or restart
        #[arg(default_value = "up")]
        action: Action,

        /// Preview a detached start
        #[arg(short, long)]
        detach: bool,
    },

    /// Validate, then start the launcher container
    Up {
        /// Return once the container is created
        #[arg(short, long)]
        detach: bool,
    },

    /// Stop the launcher container
    Down,

    /// Restart the launcher container
    Restart,
}
