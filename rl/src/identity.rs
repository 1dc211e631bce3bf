//! Run identity and the run-context contract
//!
//! The orchestration runtime tells us which task or flow is executing right
//! now. The coordinator only ever asks three questions of it: the current task
//! name, the current flow name, and whether we are running under an unattended
//! deployment.

use std::fmt;
use std::sync::RwLock;

use tracing::debug;

/// Environment variable carrying the current task name
pub const TASK_NAME_VAR: &str = "RUNLOG_TASK_NAME";

/// Environment variable carrying the current flow name
pub const FLOW_NAME_VAR: &str = "RUNLOG_FLOW_NAME";

/// Environment variable set when running under a deployment runner
pub const DEPLOYMENT_NAME_VAR: &str = "RUNLOG_DEPLOYMENT_NAME";

/// Name of the unit of work currently executing. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunIdentity(String);

impl RunIdentity {
    /// Build an identity, returning `None` for empty or blank names
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() { None } else { Some(Self(name)) }
    }

    /// Task name wins over flow name; neither means no identity
    pub fn from_names(task_name: Option<&str>, flow_name: Option<&str>) -> Option<Self> {
        task_name
            .and_then(|t| Self::new(t))
            .or_else(|| flow_name.and_then(|f| Self::new(f)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the orchestration runtime exposes about the current run
pub trait RunContext: Send + Sync {
    /// Name of the executing task, if any
    fn current_task_name(&self) -> Option<String>;

    /// Name of the executing flow, if any
    fn current_flow_name(&self) -> Option<String>;

    /// Deployment name when executing under an unattended runner
    fn deployment_name(&self) -> Option<String>;

    /// Identity used as the re-initialization trigger
    fn current_identity(&self) -> Option<RunIdentity> {
        let task = self.current_task_name();
        let flow = self.current_flow_name();
        RunIdentity::from_names(task.as_deref(), flow.as_deref())
    }

    /// True under a deployment runner, false for manual runs
    fn is_deployed(&self) -> bool {
        self.deployment_name().is_some_and(|name| !name.is_empty())
    }
}

#[derive(Debug, Default, Clone)]
struct ManualState {
    task_name: Option<String>,
    flow_name: Option<String>,
    deployment_name: Option<String>,
}

/// In-process run context driven by explicit setters
///
/// Embedders that own their own scheduling loop update it as runs start and
/// finish; it is also what the test suite drives.
#[derive(Debug, Default)]
pub struct ManualRunContext {
    state: RwLock<ManualState>,
}

impl ManualRunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or clear) the current task name
    pub fn set_task(&self, name: Option<&str>) {
        debug!(?name, "ManualRunContext::set_task");
        if let Ok(mut state) = self.state.write() {
            state.task_name = name.map(str::to_string);
        }
    }

    /// Set (or clear) the current flow name
    pub fn set_flow(&self, name: Option<&str>) {
        debug!(?name, "ManualRunContext::set_flow");
        if let Ok(mut state) = self.state.write() {
            state.flow_name = name.map(str::to_string);
        }
    }

    /// Set (or clear) the deployment name
    pub fn set_deployment(&self, name: Option<&str>) {
        debug!(?name, "ManualRunContext::set_deployment");
        if let Ok(mut state) = self.state.write() {
            state.deployment_name = name.map(str::to_string);
        }
    }

    /// Clear task and flow, leaving deployment mode untouched
    pub fn clear_run(&self) {
        if let Ok(mut state) = self.state.write() {
            state.task_name = None;
            state.flow_name = None;
        }
    }

    fn snapshot(&self) -> ManualState {
        self.state.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl RunContext for ManualRunContext {
    fn current_task_name(&self) -> Option<String> {
        self.snapshot().task_name
    }

    fn current_flow_name(&self) -> Option<String> {
        self.snapshot().flow_name
    }

    fn deployment_name(&self) -> Option<String> {
        self.snapshot().deployment_name
    }
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Run context read from `RUNLOG_*` environment variables on every call
pub struct EnvRunContext {
    lookup: Lookup,
}

impl EnvRunContext {
    /// Read from the process environment
    pub fn new() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }
}

impl Default for EnvRunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvRunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvRunContext").finish_non_exhaustive()
    }
}

impl RunContext for EnvRunContext {
    fn current_task_name(&self) -> Option<String> {
        self.var(TASK_NAME_VAR)
    }

    fn current_flow_name(&self) -> Option<String> {
        self.var(FLOW_NAME_VAR)
    }

    fn deployment_name(&self) -> Option<String> {
        self.var(DEPLOYMENT_NAME_VAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_identity_rejects_blank() {
        assert!(RunIdentity::new("").is_none());
        assert!(RunIdentity::new("   ").is_none());
        assert_eq!(RunIdentity::new("run-1").unwrap().as_str(), "run-1");
    }

    #[test]
    fn test_task_name_wins_over_flow() {
        let id = RunIdentity::from_names(Some("task-a"), Some("flow-a")).unwrap();
        assert_eq!(id.as_str(), "task-a");

        let id = RunIdentity::from_names(Some(""), Some("flow-a")).unwrap();
        assert_eq!(id.as_str(), "flow-a");

        assert!(RunIdentity::from_names(None, None).is_none());
    }

    #[test]
    fn test_manual_context() {
        let ctx = ManualRunContext::new();
        assert!(ctx.current_identity().is_none());
        assert!(!ctx.is_deployed());

        ctx.set_flow(Some("nightly-sync"));
        assert_eq!(ctx.current_identity().unwrap().as_str(), "nightly-sync");

        ctx.set_task(Some("extract-1"));
        assert_eq!(ctx.current_identity().unwrap().as_str(), "extract-1");

        ctx.set_deployment(Some("prod"));
        assert!(ctx.is_deployed());

        ctx.clear_run();
        assert!(ctx.current_identity().is_none());
        assert!(ctx.is_deployed());
    }

    #[test]
    fn test_env_context_lookup() {
        let vars: HashMap<&str, &str> = [(FLOW_NAME_VAR, "flow-x"), (TASK_NAME_VAR, ""), (DEPLOYMENT_NAME_VAR, "")]
            .into_iter()
            .collect();
        let ctx = EnvRunContext::from_lookup(move |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(ctx.current_task_name(), None);
        assert_eq!(ctx.current_identity().unwrap().as_str(), "flow-x");
        assert!(!ctx.is_deployed());
    }
}
