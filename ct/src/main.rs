use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::debug;

use commontools::cli::{Cli, Command};
use commontools::{NormalizeOptions, SqlNameNormalizer, column_name, column_number};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    debug!("ct starting: {:?}", cli.command);

    match cli.command {
        Command::ColName { numbers } => {
            for n in numbers {
                let name = column_name(n);
                if name.is_empty() {
                    eprintln!("{} {} has no column name", "✗".red(), n);
                }
                println!("{}", name);
            }
        }
        Command::ColNumber { names } => {
            for name in names {
                let n = column_number(&name).with_context(|| format!("Failed to convert '{}'", name))?;
                println!("{}", n);
            }
        }
        Command::SqlNames {
            keep_punct,
            keep_accents,
            names,
        } => {
            let normalizer = SqlNameNormalizer::new(NormalizeOptions {
                remove_punct: !keep_punct,
                remove_accents: !keep_accents,
            })?;
            for name in normalizer.standardize_all(&names) {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
