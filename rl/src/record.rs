//! Log record routed through hierarchies

use chrono::{DateTime, Local};
use log::Level;

/// A single log event
#[derive(Debug, Clone)]
pub struct Record {
    pub level: Level,
    /// Logger name the record was emitted through
    pub target: String,
    pub message: String,
    pub timestamp: DateTime<Local>,
    /// Flow run the record belongs to, if any
    pub flow_name: Option<String>,
    /// Task run the record belongs to, if any
    pub task_name: Option<String>,
}

impl Record {
    pub fn new(level: Level, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            target: target.into(),
            message: message.into(),
            timestamp: Local::now(),
            flow_name: None,
            task_name: None,
        }
    }

    pub fn with_flow(mut self, flow_name: Option<String>) -> Self {
        self.flow_name = flow_name;
        self
    }

    pub fn with_task(mut self, task_name: Option<String>) -> Self {
        self.task_name = task_name;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl From<&log::Record<'_>> for Record {
    fn from(record: &log::Record<'_>) -> Self {
        Self::new(record.level(), record.target(), record.args().to_string())
    }
}
