// ABOUTME: Library root for craftpod - exposes detection, preflight, composition and lifecycle.
// ABOUTME: The main binary is in main.rs.

pub mod compose;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod output;
pub mod preflight;
pub mod types;
