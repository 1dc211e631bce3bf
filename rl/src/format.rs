//! Record formatting
//!
//! Templates use `{field}` or `{field:<N}` / `{field:>N}` placeholders. Known
//! fields are `asctime`, `levelname`, `name`, `message`, `flow_name` and
//! `task_name`. Literal braces are written `{{` and `}}`.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::record::Record;

pub const DEFAULT_FORMAT: &str = "{asctime} | {levelname:<7} | {name} - {message}";
pub const DEFAULT_DATEFMT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_FLOW_RUN_FORMAT: &str = "{asctime} | {levelname:<7} | Flow '{flow_name}' - {message}";
pub const DEFAULT_TASK_RUN_FORMAT: &str = "{asctime} | {levelname:<7} | Task '{task_name}' - {message}";

/// How records are turned into lines
///
/// Records from a task run use `task_run_fmt`, records from a flow run use
/// `flow_run_fmt`, everything else uses `format`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    #[serde(default = "default_format")]
    pub format: String,
    /// chrono strftime pattern for `asctime`
    #[serde(default = "default_datefmt")]
    pub datefmt: String,
    #[serde(default = "default_flow_run_fmt")]
    pub flow_run_fmt: String,
    #[serde(default = "default_task_run_fmt")]
    pub task_run_fmt: String,
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_datefmt() -> String {
    DEFAULT_DATEFMT.to_string()
}

fn default_flow_run_fmt() -> String {
    DEFAULT_FLOW_RUN_FORMAT.to_string()
}

fn default_task_run_fmt() -> String {
    DEFAULT_TASK_RUN_FORMAT.to_string()
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            format: default_format(),
            datefmt: default_datefmt(),
            flow_run_fmt: default_flow_run_fmt(),
            task_run_fmt: default_task_run_fmt(),
        }
    }
}

impl FormatSpec {
    /// Single template for every record kind
    pub fn uniform(format: impl Into<String>) -> Self {
        let format = format.into();
        Self {
            format: format.clone(),
            datefmt: default_datefmt(),
            flow_run_fmt: format.clone(),
            task_run_fmt: format,
        }
    }

    fn template_for(&self, record: &Record) -> &str {
        if record.task_name.is_some() {
            &self.task_run_fmt
        } else if record.flow_name.is_some() {
            &self.flow_run_fmt
        } else {
            &self.format
        }
    }

    /// Render a record, without trailing newline
    pub fn render(&self, record: &Record) -> String {
        let template = self.template_for(record);
        let mut out = String::with_capacity(template.len() + record.message.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut spec = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        spec.push(c);
                    }
                    if !closed {
                        out.push('{');
                        out.push_str(&spec);
                        continue;
                    }
                    self.render_placeholder(&spec, record, &mut out);
                }
                c => out.push(c),
            }
        }

        out
    }

    fn render_placeholder(&self, spec: &str, record: &Record, out: &mut String) {
        let (field, align) = match spec.split_once(':') {
            Some((field, align)) => (field, Some(align)),
            None => (spec, None),
        };

        let value = match field {
            "asctime" => {
                let mut stamp = String::new();
                if write!(stamp, "{}", record.timestamp.format(&self.datefmt)).is_err() {
                    stamp = record.timestamp.to_rfc3339();
                }
                stamp
            }
            "levelname" => record.level.as_str().to_string(),
            "name" => record.target.clone(),
            "message" => record.message.clone(),
            "flow_name" => record.flow_name.clone().unwrap_or_default(),
            "task_name" => record.task_name.clone().unwrap_or_default(),
            _ => {
                out.push('{');
                out.push_str(spec);
                out.push('}');
                return;
            }
        };

        match align.and_then(parse_align) {
            Some((Align::Left, width)) => out.push_str(&format!("{:<width$}", value, width = width)),
            Some((Align::Right, width)) => out.push_str(&format!("{:>width$}", value, width = width)),
            None => out.push_str(&value),
        }
    }
}

enum Align {
    Left,
    Right,
}

fn parse_align(spec: &str) -> Option<(Align, usize)> {
    let (align, width) = match spec.chars().next()? {
        '<' => (Align::Left, &spec[1..]),
        '>' => (Align::Right, &spec[1..]),
        _ => (Align::Left, spec),
    };
    width.parse().ok().map(|w| (align, w))
}
