//! Configuration for runlog

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::filter::ExcludeSubstrings;
use crate::format::FormatSpec;
use crate::sink::{RotationSchedule, RotationUnit};

/// Periods per rotation
pub const DEFAULT_INTERVAL: u32 = 1;

/// Backups kept after rotation
pub const DEFAULT_BACKUP_COUNT: u32 = 12;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write config {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Rotation interval must be positive")]
    InvalidInterval,

    #[error("Unknown rotation unit '{0}' (expected S, M, H, D, MIDNIGHT or W0-W6)")]
    UnknownRotationUnit(String),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),
}

/// Settings of one coordinator's sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Base path of the active log file
    pub log_path: PathBuf,

    #[serde(default)]
    pub rotation_unit: RotationUnit,

    #[serde(default = "default_interval")]
    pub interval: u32,

    #[serde(default = "default_backup_count")]
    pub backup_count: u32,

    #[serde(default)]
    pub formatter: FormatSpec,

    /// Records whose message contains any of these are not written
    #[serde(default)]
    pub exclude_substrings: Vec<String>,
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL
}

fn default_backup_count() -> u32 {
    DEFAULT_BACKUP_COUNT
}

impl LoggerConfig {
    /// Weekly rotation on Monday, one week per file, twelve backups
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            rotation_unit: RotationUnit::default(),
            interval: DEFAULT_INTERVAL,
            backup_count: DEFAULT_BACKUP_COUNT,
            formatter: FormatSpec::default(),
            exclude_substrings: Vec::new(),
        }
    }

    pub fn schedule(&self) -> RotationSchedule {
        RotationSchedule::new(self.rotation_unit, self.interval, self.backup_count)
    }

    pub fn filter(&self) -> ExcludeSubstrings {
        ExcludeSubstrings::new(self.exclude_substrings.iter().cloned())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if StrftimeItems::new(&self.formatter.datefmt).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(self.formatter.datefmt.clone()));
        }
        Ok(())
    }
}

/// Optional overrides read from a config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_unit: Option<RotationUnit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter: Option<FormatSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_substrings: Option<Vec<String>>,
}

impl LoggerOverrides {
    /// Layer these overrides on top of `base`
    pub fn apply(&self, mut base: LoggerConfig) -> LoggerConfig {
        if let Some(path) = &self.log_path {
            base.log_path = path.clone();
        }
        if let Some(unit) = self.rotation_unit {
            base.rotation_unit = unit;
        }
        if let Some(interval) = self.interval {
            base.interval = interval;
        }
        if let Some(backup_count) = self.backup_count {
            base.backup_count = backup_count;
        }
        if let Some(formatter) = &self.formatter {
            base.formatter = formatter.clone();
        }
        if let Some(exclude) = &self.exclude_substrings {
            base.exclude_substrings = exclude.clone();
        }
        base
    }
}

/// Config file for the `rl` binary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logger: LoggerOverrides,

    /// Level for rl's own diagnostics (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Extension appended to default log file names, e.g. `log`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_extension: Option<String>,
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        if let Some(config_path) = path {
            return Self::from_file(config_path);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("runlog").join("config.yml")),
            Some(PathBuf::from("runlog.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        debug!("Config::load: no config file found, using defaults");
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(?path, "Config::from_file");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
