// ABOUTME: Host capability detection for container runtime, GPU, display and audio.
// ABOUTME: Auto-detects what the host offers so the launcher can pass it through.

mod detection;
mod paths;
mod types;

pub use detection::{
    AudioDetail, DetectionDetails, DetectionResult, Detector, DisplayDetail, GpuDetail,
    RuntimeDetail, detect_system, get_detection_details,
};
pub use paths::{HostPaths, HostSockets};
pub use types::{
    AudioServer, DisplayServer, GpuVendor, ParseHostValueError, Runtime, RuntimeFlavor,
};

pub(crate) use paths::env_non_empty;
