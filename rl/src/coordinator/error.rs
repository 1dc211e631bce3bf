//! Coordinator error types

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::sink::SinkError;

/// Errors surfaced by [`super::Coordinator`]
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Failed to create log directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dir_message() {
        let err = CoordinatorError::CreateDir {
            path: PathBuf::from("/app/jobs/logs"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };

        let msg = err.to_string();
        assert!(msg.contains("/app/jobs/logs"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err = CoordinatorError::from(ConfigError::InvalidInterval);
        assert_eq!(err.to_string(), "Rotation interval must be positive");
    }
}
