// ABOUTME: Application-wide error types for craftpod.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("could not determine the user config directory")]
    NoConfigDir,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("system validation failed with {0} blocking issue(s)")]
    ValidationFailed(usize),

    #[error("container exited with an error")]
    ContainerFailed,

    #[error("{program} exited with status {code:?}")]
    CommandFailed { program: String, code: Option<i32> },

    #[error("container could not be started: {0}")]
    Start(#[from] crate::lifecycle::StartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_failure_is_not_reported_as_bad_config() {
        let source = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = Error::from(source);
        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().starts_with("JSON serialization error:"));
    }
}
