//! Time-rotated log file sink safe for concurrent writer processes

mod file;
mod rotation;

pub use file::RotatingFileSink;
pub use rotation::{RotationSchedule, RotationUnit};

use std::path::PathBuf;

use thiserror::Error;

use crate::hierarchy::HandlerTag;

/// Tag carried by every [`RotatingFileSink`]
pub const ROTATING_SINK_TAG: HandlerTag = HandlerTag::new("runlog.rotating-file");

/// Errors raised by the rotating sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open log file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rotate {path} to {backup}")]
    Rotate {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to prune backups in {dir}")]
    Prune {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid backup pattern: {0}")]
    Pattern(#[from] regex::Error),
}
