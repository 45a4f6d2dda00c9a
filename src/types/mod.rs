// ABOUTME: Validated domain types shared by config, composition and lifecycle.
// ABOUTME: Parsing happens once at the config boundary.

mod container_name;
mod ready_pattern;

pub use container_name::{ContainerName, ContainerNameError};
pub use ready_pattern::{DEFAULT_READY_PATTERN, ReadyPattern, ReadyPatternError};
