//! Handle to the per-run hierarchy

use std::sync::Arc;

use log::Level;

use crate::hierarchy::Hierarchy;
use crate::record::Record;

/// Logger bound to the run hierarchy
///
/// Carries the flow and task names that were current when it was produced, so
/// records it emits are attributed to that run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    hierarchy: Arc<Hierarchy>,
    flow_name: Option<String>,
    task_name: Option<String>,
}

impl RunLogger {
    pub fn new(hierarchy: Arc<Hierarchy>, flow_name: Option<String>, task_name: Option<String>) -> Self {
        Self {
            hierarchy,
            flow_name,
            task_name,
        }
    }

    pub fn hierarchy(&self) -> &Arc<Hierarchy> {
        &self.hierarchy
    }

    pub fn flow_name(&self) -> Option<&str> {
        self.flow_name.as_deref()
    }

    pub fn task_name(&self) -> Option<&str> {
        self.task_name.as_deref()
    }

    /// True when both handles write through the same hierarchy for the same run
    pub fn same_binding(&self, other: &RunLogger) -> bool {
        Arc::ptr_eq(&self.hierarchy, &other.hierarchy)
            && self.flow_name == other.flow_name
            && self.task_name == other.task_name
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        let record = Record::new(level, self.hierarchy.name(), message)
            .with_flow(self.flow_name.clone())
            .with_task(self.task_name.clone());
        self.hierarchy.log(&record);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }
}
