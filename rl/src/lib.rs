//! runlog - run-scoped rotating log sinks for long-lived workers
//!
//! A worker process executes many flow and task runs one after another. Each
//! run logs through a framework-supplied run hierarchy while library code logs
//! through the process root hierarchy. runlog keeps exactly one rotating file
//! sink bound in each of them and swaps it whenever the current run changes.
//!
//! # Architecture
//!
//! ```text
//! RunContext ──identity──▶ Coordinator ──bind_tagged──▶ root Hierarchy
//!                              │         └─bind_tagged──▶ run Hierarchy
//!                              ▼
//!                       RotatingFileSink ──▶ <script dir>/logs/<script name>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use runlog::{Coordinator, EnvRunContext, Hierarchy};
//!
//! let root = Arc::new(Hierarchy::new("root"));
//! let run = Arc::new(Hierarchy::new("run"));
//! let mut coordinator = Coordinator::new(file!(), None, root, run, Arc::new(EnvRunContext::new()));
//! if let Some(logger) = coordinator.get_logger()? {
//!     logger.info("rows loaded");
//! }
//! ```

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod filter;
pub mod format;
pub mod hierarchy;
pub mod identity;
pub mod logger;
pub mod path;
pub mod record;
pub mod sink;

pub use config::{Config, ConfigError, LoggerConfig};
pub use coordinator::{BindState, Coordinator, CoordinatorError, InitReport, ReconfigureRequest, Transition, next_state};
pub use filter::ExcludeSubstrings;
pub use format::FormatSpec;
pub use hierarchy::{BindOutcome, ConsoleHandler, Handler, HandlerError, HandlerTag, Hierarchy, install_global};
pub use identity::{EnvRunContext, ManualRunContext, RunContext, RunIdentity};
pub use logger::RunLogger;
pub use record::Record;
pub use sink::{ROTATING_SINK_TAG, RotatingFileSink, RotationSchedule, RotationUnit, SinkError};
