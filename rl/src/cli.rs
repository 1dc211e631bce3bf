//! CLI argument parsing for runlog

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rl")]
#[command(author, version, about = "Run-scoped rotating log sinks", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Level for rl's own diagnostics (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the default log path for a script
    Path {
        /// Script the log belongs to
        #[arg(required = true)]
        script: PathBuf,

        /// Extension appended to the log file name (e.g. log)
        #[arg(short, long)]
        ext: Option<String>,
    },

    /// Write a message through the coordinator for the current run
    ///
    /// The run is read from RUNLOG_TASK_NAME / RUNLOG_FLOW_NAME and deployment
    /// mode from RUNLOG_DEPLOYMENT_NAME.
    Emit {
        /// Script the log belongs to
        #[arg(required = true)]
        script: PathBuf,

        /// Message to write
        #[arg(required = true)]
        message: String,

        /// Record level
        #[arg(short, long, default_value = "info")]
        level: String,

        /// Log file to use instead of the script default
        #[arg(long)]
        log_path: Option<PathBuf>,
    },

    /// Print the effective logger configuration for a script
    ShowConfig {
        /// Script the log belongs to
        #[arg(required = true)]
        script: PathBuf,
    },
}
