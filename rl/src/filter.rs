//! Message filters applied by sinks before formatting

use crate::record::Record;

/// Messages the orchestration runtime emits for every run transition
pub const FRAMEWORK_NOISE: [&str; 3] = ["Created task run", "Created flow run", "Executing"];

/// Drops records whose message contains any of the configured substrings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSubstrings {
    patterns: Vec<String>,
}

impl ExcludeSubstrings {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).filter(|p: &String| !p.is_empty()).collect(),
        }
    }

    /// Filter for run-transition chatter
    pub fn framework_noise() -> Self {
        Self::new(FRAMEWORK_NOISE)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when the record should be written
    pub fn allows(&self, record: &Record) -> bool {
        !self.patterns.iter().any(|p| record.message.contains(p.as_str()))
    }
}
