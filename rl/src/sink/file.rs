//! Rotating file sink
//!
//! Every write takes an exclusive advisory lock on `<path>.lock`, performs any
//! due rollover, appends the whole line in one write, and releases the lock.
//! The active file is reopened per write so a rollover done by another process
//! is picked up immediately.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use fs2::FileExt;
use tracing::{debug, warn};

use super::rotation::RotationSchedule;
use super::{ROTATING_SINK_TAG, SinkError};
use crate::filter::ExcludeSubstrings;
use crate::format::FormatSpec;
use crate::hierarchy::{Handler, HandlerError, HandlerTag};
use crate::record::Record;

/// Log file that rotates on a time schedule and keeps a bounded set of backups
#[derive(Debug)]
pub struct RotatingFileSink {
    path: PathBuf,
    lock_path: PathBuf,
    schedule: RotationSchedule,
    formatter: FormatSpec,
    filter: ExcludeSubstrings,
    /// End of the current period, as seen by this writer
    rollover_at: Mutex<DateTime<Local>>,
}

impl RotatingFileSink {
    /// Open (or create) the log file; the parent directory must exist
    pub fn new(path: impl AsRef<Path>, schedule: RotationSchedule) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;

        let started = file
            .metadata()
            .and_then(|m| m.modified())
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());
        let rollover_at = schedule.next_rollover(started);
        debug!(?path, unit = %schedule.unit, interval = schedule.interval, %rollover_at, "RotatingFileSink::new");

        Ok(Self {
            lock_path: with_suffix(&path, "lock"),
            path,
            schedule,
            formatter: FormatSpec::default(),
            filter: ExcludeSubstrings::default(),
            rollover_at: Mutex::new(rollover_at),
        })
    }

    pub fn set_formatter(&mut self, formatter: FormatSpec) {
        self.formatter = formatter;
    }

    pub fn set_filter(&mut self, filter: ExcludeSubstrings) {
        self.filter = filter;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schedule(&self) -> RotationSchedule {
        self.schedule
    }

    pub fn formatter(&self) -> &FormatSpec {
        &self.formatter
    }

    /// When this writer will next roll the file over
    pub fn next_rollover(&self) -> DateTime<Local> {
        *self.rollover_at.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write one record
    pub fn emit(&self, record: &Record) -> Result<(), SinkError> {
        self.emit_at(record, Local::now())
    }

    pub(crate) fn emit_at(&self, record: &Record, now: DateTime<Local>) -> Result<(), SinkError> {
        if !self.filter.allows(record) {
            return Ok(());
        }

        let mut line = self.formatter.render(record);
        line.push('\n');

        let mut rollover_at = self.rollover_at.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = LockFile::acquire(&self.lock_path)?;

        if now >= *rollover_at {
            *rollover_at = self.rollover(*rollover_at, now)?;
        }

        let mut file = open_append(&self.path)?;
        file.write_all(line.as_bytes()).map_err(|source| SinkError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Move the active file aside for the period ending at `due`
    ///
    /// Must be called with the lock file held. Returns the next rollover instant.
    fn rollover(&self, due: DateTime<Local>, now: DateTime<Local>) -> Result<DateTime<Local>, SinkError> {
        let backup = with_suffix(&self.path, &self.schedule.backup_suffix(due));

        if backup.exists() {
            debug!(?backup, "RotatingFileSink::rollover: already rotated by another writer");
        } else if self.path.exists() {
            fs::rename(&self.path, &backup).map_err(|source| SinkError::Rotate {
                path: self.path.clone(),
                backup: backup.clone(),
                source,
            })?;
            debug!(path = ?self.path, ?backup, "RotatingFileSink::rollover: rotated");
            self.prune()?;
        }

        Ok(self.schedule.next_rollover(now))
    }

    /// Delete the oldest backups beyond the retention count
    fn prune(&self) -> Result<Vec<PathBuf>, SinkError> {
        let keep = self.schedule.backup_count as usize;
        if keep == 0 {
            return Ok(Vec::new());
        }

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = format!(
            "{}.",
            self.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        );
        let pattern = self.schedule.unit.suffix_regex()?;
        let prune_err = |source: std::io::Error| SinkError::Prune {
            dir: dir.clone(),
            source,
        };

        let mut backups = Vec::new();
        for entry in fs::read_dir(&dir).map_err(prune_err)? {
            let entry = entry.map_err(prune_err)?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(suffix) = name.strip_prefix(&prefix)
                && pattern.is_match(suffix)
            {
                backups.push(entry.path());
            }
        }
        backups.sort();

        let excess = backups.len().saturating_sub(keep);
        let removed: Vec<PathBuf> = backups.drain(..excess).collect();
        for old in &removed {
            match fs::remove_file(old) {
                Ok(()) => debug!(?old, "RotatingFileSink::prune: removed backup"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(prune_err(e)),
            }
        }
        Ok(removed)
    }
}

impl Handler for RotatingFileSink {
    fn handle(&self, record: &Record) -> Result<(), HandlerError> {
        self.emit(record)?;
        Ok(())
    }

    fn tag(&self) -> Option<HandlerTag> {
        Some(ROTATING_SINK_TAG)
    }
}

fn open_append(path: &Path) -> Result<File, SinkError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// `path` with `.suffix` appended to its file name
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Exclusive advisory lock held until drop
struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: &Path) -> Result<Self, SinkError> {
        let lock_err = |source: std::io::Error| SinkError::Lock {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(lock_err)?;
        FileExt::lock_exclusive(&file).map_err(lock_err)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = ?self.path, error = %e, "LockFile: failed to unlock");
        }
    }
}
