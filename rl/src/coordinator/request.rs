//! Reconfiguration requests and initialization reports

use std::path::PathBuf;

use crate::format::FormatSpec;
use crate::hierarchy::BindOutcome;
use crate::identity::RunIdentity;
use crate::sink::RotationUnit;

/// Changes requested through [`super::Coordinator::reconfigure`]
///
/// Fields left `None` keep their current value. A zero `interval` or
/// `backup_count` also keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconfigureRequest {
    /// Must name an existing location, else it is ignored with a warning
    pub log_path: Option<PathBuf>,
    pub rotation_unit: Option<RotationUnit>,
    pub interval: Option<u32>,
    pub backup_count: Option<u32>,
    pub formatter: Option<FormatSpec>,
}

impl ReconfigureRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn rotation_unit(mut self, unit: RotationUnit) -> Self {
        self.rotation_unit = Some(unit);
        self
    }

    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn backup_count(mut self, backup_count: u32) -> Self {
        self.backup_count = Some(backup_count);
        self
    }

    pub fn formatter(mut self, formatter: FormatSpec) -> Self {
        self.formatter = Some(formatter);
        self
    }
}

/// What the most recent (re)initialization did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// Identity current at the time, if any
    pub identity: Option<RunIdentity>,
    /// Directory created for the log file
    pub created_dir: Option<PathBuf>,
    pub root: BindOutcome,
    /// `None` when running under a deployment runner
    pub run: Option<BindOutcome>,
}
