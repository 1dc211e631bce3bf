//! Coordinator implementation

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::Level;
use tracing::{debug, info, warn};

use super::error::CoordinatorError;
use super::request::{InitReport, ReconfigureRequest};
use super::state::{BindState, Transition, next_state};
use crate::config::LoggerConfig;
use crate::hierarchy::Hierarchy;
use crate::identity::{RunContext, RunIdentity};
use crate::logger::RunLogger;
use crate::path;
use crate::record::Record;
use crate::sink::RotatingFileSink;

/// Keeps one rotating file sink bound in the root and run hierarchies
///
/// Construction is lazy: nothing touches the filesystem or the hierarchies
/// until the first [`Coordinator::get_logger`] call that sees a run identity.
/// Every later call re-binds only when the identity changed, replacing the
/// sink it installed earlier in place so handlers never accumulate.
pub struct Coordinator {
    config: LoggerConfig,
    /// Path derived from the script, before any override
    default_log_path: PathBuf,
    root: Arc<Hierarchy>,
    run: Arc<Hierarchy>,
    context: Arc<dyn RunContext>,
    state: BindState,
    sink: Option<Arc<RotatingFileSink>>,
    logger: Option<RunLogger>,
    last_report: Option<InitReport>,
}

impl Coordinator {
    /// Create a coordinator for the script at `script_path`
    ///
    /// `log_path` overrides the default `<script dir>/logs/<script name>`.
    pub fn new(
        script_path: impl AsRef<Path>,
        log_path: Option<PathBuf>,
        root: Arc<Hierarchy>,
        run: Arc<Hierarchy>,
        context: Arc<dyn RunContext>,
    ) -> Self {
        let default_log_path = path::resolve_default(script_path.as_ref());
        let log_path = log_path.unwrap_or_else(|| default_log_path.clone());
        debug!(?default_log_path, ?log_path, "Coordinator::new");

        Self {
            config: LoggerConfig::new(log_path),
            default_log_path,
            root,
            run,
            context,
            state: BindState::Uninitialized,
            sink: None,
            logger: None,
            last_report: None,
        }
    }

    /// Create a coordinator from a prepared configuration
    pub fn with_config(
        script_path: impl AsRef<Path>,
        config: LoggerConfig,
        root: Arc<Hierarchy>,
        run: Arc<Hierarchy>,
        context: Arc<dyn RunContext>,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;
        let mut coordinator = Self::new(script_path, Some(config.log_path.clone()), root, run, context);
        coordinator.config = config;
        Ok(coordinator)
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn default_log_path(&self) -> &Path {
        &self.default_log_path
    }

    pub fn state(&self) -> &BindState {
        &self.state
    }

    /// Sink installed by the last initialization
    pub fn active_sink(&self) -> Option<&Arc<RotatingFileSink>> {
        self.sink.as_ref()
    }

    pub fn last_report(&self) -> Option<&InitReport> {
        self.last_report.as_ref()
    }

    pub fn root(&self) -> &Arc<Hierarchy> {
        &self.root
    }

    pub fn run(&self) -> &Arc<Hierarchy> {
        &self.run
    }

    /// Logger for the current run
    ///
    /// Re-initializes when the run identity differs from the one last seen.
    /// Without an identity the previous handle is returned unchanged, which is
    /// `None` if no run has been seen yet.
    pub fn get_logger(&mut self) -> Result<Option<RunLogger>, CoordinatorError> {
        let identity = self.context.current_identity();
        let (next, transition) = next_state(&self.state, identity.as_ref());

        if transition == Transition::Initialize {
            debug!(previous = ?self.state.identity(), current = ?identity, "Coordinator::get_logger: run changed");
            self.initialize(identity)?;
            self.state = next;
        }

        Ok(self.logger.clone())
    }

    /// Apply new settings and re-bind the sinks regardless of identity
    ///
    /// A `log_path` that does not exist is reported with a single warning and
    /// the current path is kept.
    pub fn reconfigure(&mut self, request: ReconfigureRequest) -> Result<Option<RunLogger>, CoordinatorError> {
        debug!(?request, "Coordinator::reconfigure");

        let mut candidate = self.config.clone();
        if let Some(requested) = request.log_path {
            if requested.is_dir() {
                let file_name = candidate
                    .log_path
                    .file_name()
                    .map(|n| n.to_os_string())
                    .unwrap_or_else(|| self.default_file_name());
                candidate.log_path = requested.join(file_name);
            } else if requested.exists() {
                candidate.log_path = requested;
            } else {
                let message = format!(
                    "Could not change the log location: {} was not found. Using the default {}",
                    requested.display(),
                    self.default_log_path.display()
                );
                self.diagnostic(Level::Warn, &message);
                candidate.log_path = self.default_log_path.clone();
            }
        }

        if let Some(unit) = request.rotation_unit {
            candidate.rotation_unit = unit;
        }
        if let Some(interval) = request.interval.filter(|&n| n > 0) {
            candidate.interval = interval;
        }
        if let Some(backup_count) = request.backup_count.filter(|&n| n > 0) {
            candidate.backup_count = backup_count;
        }
        if let Some(formatter) = request.formatter {
            candidate.formatter = formatter;
        }
        candidate.validate()?;

        // initialize builds sinks from self.config
        let previous = std::mem::replace(&mut self.config, candidate);
        let identity = self.context.current_identity().or_else(|| self.state.identity().cloned());
        if let Err(e) = self.initialize(identity.clone()) {
            warn!(error = %e, "Coordinator::reconfigure: keeping previous configuration");
            self.config = previous;
            return Err(e);
        }
        if let Some(identity) = identity {
            self.state = BindState::Bound(identity);
        }

        Ok(self.logger.clone())
    }

    fn default_file_name(&self) -> std::ffi::OsString {
        self.default_log_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "runlog".into())
    }

    /// Create the log directory if needed, build a fresh sink and bind it
    fn initialize(&mut self, identity: Option<RunIdentity>) -> Result<(), CoordinatorError> {
        let created_dir = self.ensure_log_dir()?;

        let mut sink = RotatingFileSink::new(&self.config.log_path, self.config.schedule())?;
        sink.set_formatter(self.config.formatter.clone());
        sink.set_filter(self.config.filter());
        let sink = Arc::new(sink);

        let root = self.root.bind_tagged(sink.clone());
        // A deployment runner manages the run hierarchy's handlers itself
        let run = if self.context.is_deployed() {
            debug!("Coordinator::initialize: deployed, leaving run hierarchy alone");
            None
        } else {
            Some(self.run.bind_tagged(sink.clone()))
        };

        let flow_name = self.context.current_flow_name().filter(|n| !n.is_empty());
        let task_name = self.context.current_task_name().filter(|n| !n.is_empty());
        self.logger = Some(RunLogger::new(self.run.clone(), flow_name, task_name));
        self.sink = Some(sink);

        let report = InitReport {
            identity,
            created_dir,
            root,
            run,
        };
        info!(log_path = ?self.config.log_path, ?report, "Coordinator::initialize: sinks bound");
        self.last_report = Some(report);
        Ok(())
    }

    /// Single-level create of the log file's parent directory
    fn ensure_log_dir(&self) -> Result<Option<PathBuf>, CoordinatorError> {
        let Some(dir) = self.config.log_path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(None);
        };
        if dir.is_dir() {
            return Ok(None);
        }

        let message = format!("Log directory not found, creating it: {}", dir.display());
        self.diagnostic(Level::Info, &message);

        match fs::create_dir(dir) {
            Ok(()) => Ok(Some(dir.to_path_buf())),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(?dir, "Coordinator::ensure_log_dir: created concurrently");
                Ok(None)
            }
            Err(source) => Err(CoordinatorError::CreateDir {
                path: dir.to_path_buf(),
                source,
            }),
        }
    }

    /// Report through the current logger, else the run hierarchy, else stderr
    fn diagnostic(&self, level: Level, message: &str) {
        match level {
            Level::Error | Level::Warn => warn!(diagnostic = %message, "Coordinator::diagnostic"),
            _ => info!(diagnostic = %message, "Coordinator::diagnostic"),
        }

        if let Some(logger) = &self.logger {
            logger.log(level, message);
        } else if !self.run.is_empty() {
            self.run.log(&Record::new(level, self.run.name(), message));
        } else {
            eprintln!("{}: {}", level, message);
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("root", &self.root)
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::BindOutcome;
    use crate::identity::ManualRunContext;
    use crate::sink::ROTATING_SINK_TAG;
    use tempfile::TempDir;

    fn setup(temp: &TempDir) -> (Coordinator, Arc<ManualRunContext>) {
        let context = Arc::new(ManualRunContext::new());
        let script = temp.path().join("jobs").join("sync.py");
        fs::create_dir_all(script.parent().unwrap()).unwrap();
        let coordinator = Coordinator::new(
            &script,
            None,
            Arc::new(Hierarchy::new("root")),
            Arc::new(Hierarchy::new("run")),
            context.clone(),
        );
        (coordinator, context)
    }

    #[test]
    fn test_construction_is_lazy() {
        let temp = TempDir::new().unwrap();
        let (coordinator, _context) = setup(&temp);

        assert_eq!(coordinator.config().log_path, temp.path().join("jobs/logs/sync"));
        assert!(!temp.path().join("jobs/logs").exists());
        assert!(coordinator.root().is_empty());
        assert!(coordinator.run().is_empty());
        assert!(coordinator.last_report().is_none());
    }

    #[test]
    fn test_deployed_skips_run_hierarchy() {
        let temp = TempDir::new().unwrap();
        let (mut coordinator, context) = setup(&temp);
        context.set_deployment(Some("nightly-prod"));
        context.set_flow(Some("sync"));

        let logger = coordinator.get_logger().unwrap();
        assert!(logger.is_some());
        assert_eq!(coordinator.root().count_tagged(ROTATING_SINK_TAG), 1);
        assert_eq!(coordinator.run().count_tagged(ROTATING_SINK_TAG), 0);

        let report = coordinator.last_report().unwrap();
        assert_eq!(report.root, BindOutcome::Appended { index: 0 });
        assert_eq!(report.run, None);
    }

    #[test]
    fn test_directory_creation_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let context = Arc::new(ManualRunContext::new());
        context.set_task(Some("t"));
        // Two missing levels: only one is ever created
        let log_path = temp.path().join("a").join("b").join("sync");
        let mut coordinator = Coordinator::new(
            temp.path().join("sync.py"),
            Some(log_path),
            Arc::new(Hierarchy::new("root")),
            Arc::new(Hierarchy::new("run")),
            context,
        );

        let err = coordinator.get_logger().unwrap_err();
        assert!(matches!(err, CoordinatorError::CreateDir { .. }));
        assert_eq!(coordinator.state(), &BindState::Uninitialized);
    }

    #[test]
    fn test_with_config_validates() {
        let temp = TempDir::new().unwrap();
        let mut config = LoggerConfig::new(temp.path().join("x"));
        config.interval = 0;
        let result = Coordinator::with_config(
            temp.path().join("x.py"),
            config,
            Arc::new(Hierarchy::new("root")),
            Arc::new(Hierarchy::new("run")),
            Arc::new(ManualRunContext::new()),
        );
        assert!(matches!(result, Err(CoordinatorError::Config(_))));
    }

    #[test]
    fn test_reconfigure_existing_directory_keeps_file_name() {
        let temp = TempDir::new().unwrap();
        let (mut coordinator, context) = setup(&temp);
        context.set_task(Some("t1"));
        coordinator.get_logger().unwrap();

        let elsewhere = temp.path().join("elsewhere");
        fs::create_dir(&elsewhere).unwrap();
        coordinator
            .reconfigure(ReconfigureRequest::new().log_path(&elsewhere))
            .unwrap();

        assert_eq!(coordinator.config().log_path, elsewhere.join("sync"));
        assert!(elsewhere.join("sync").exists());
    }
}
