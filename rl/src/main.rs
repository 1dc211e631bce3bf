use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use tracing::{debug, info};

use runlog::cli::{Cli, Command};
use runlog::config::{Config, LoggerConfig};
use runlog::{ConsoleHandler, Coordinator, EnvRunContext, FormatSpec, Hierarchy, RunContext, install_global, path};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > WARN
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    // The `log` facade is left free for the root hierarchy
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to initialize tracing")?;

    debug!(?level, "Logging initialized");
    Ok(())
}

/// Default log path for a script, honouring the configured extension
fn default_log_path(script: &Path, config: &Config) -> PathBuf {
    match config.log_extension.as_deref() {
        Some(ext) => path::resolve_default_with_extension(script, ext),
        None => path::resolve_default(script),
    }
}

fn effective_config(script: &Path, log_path: Option<PathBuf>, config: &Config) -> LoggerConfig {
    let base = LoggerConfig::new(default_log_path(script, config));
    let mut logger = config.logger.apply(base);
    if let Some(log_path) = log_path {
        logger.log_path = log_path;
    }
    logger
}

fn cmd_emit(script: &Path, message: &str, level: &str, log_path: Option<PathBuf>, config: &Config) -> Result<()> {
    let level = log::Level::from_str(level).map_err(|_| eyre::eyre!("Unknown level '{}'", level))?;
    let script = path::absolute_script_path(script);
    let logger_config = effective_config(&script, log_path, config);

    let root = Arc::new(Hierarchy::new("root").with_level(level.to_level_filter()));
    let run = Arc::new(Hierarchy::new("run").with_level(level.to_level_filter()));
    run.add_handler(Arc::new(ConsoleHandler::new(FormatSpec::default())));
    install_global(root.clone()).context("Failed to install root logger")?;

    let context = Arc::new(EnvRunContext::new());
    if context.current_identity().is_none() {
        bail!("No current run: set RUNLOG_TASK_NAME or RUNLOG_FLOW_NAME");
    }

    let mut coordinator =
        Coordinator::with_config(&script, logger_config, root, run, context).context("Invalid logger configuration")?;
    let logger = coordinator
        .get_logger()
        .context("Failed to bind log sinks")?
        .ok_or_else(|| eyre::eyre!("No run logger available"))?;

    logger.log(level, message);
    info!(log_path = ?coordinator.config().log_path, "cmd_emit: message written");
    println!(
        "{} Wrote to {}",
        "✓".green(),
        coordinator.config().log_path.display().to_string().cyan()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    match cli.command {
        Command::Path { script, ext } => {
            let path = match ext {
                Some(ext) => path::resolve_default_with_extension(&script, &ext),
                None => default_log_path(&script, &config),
            };
            println!("{}", path.display());
        }
        Command::Emit {
            script,
            message,
            level,
            log_path,
        } => {
            cmd_emit(&script, &message, &level, log_path, &config)?;
        }
        Command::ShowConfig { script } => {
            let logger = effective_config(&path::absolute_script_path(&script), None, &config);
            logger.validate().context("Invalid logger configuration")?;
            print!("{}", serde_yaml::to_string(&logger)?);
        }
    }

    Ok(())
}
