//! CLI argument parsing for commontools

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ct")]
#[command(author, version, about = "Column helpers for data jobs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the spreadsheet column name for each number
    ColName {
        /// 1-based column numbers
        #[arg(required = true)]
        numbers: Vec<u32>,
    },

    /// Print the 1-based number for each spreadsheet column name
    ColNumber {
        /// Column names such as A, AA, xfd
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Standardize column headers into SQL-safe names
    SqlNames {
        /// Leave punctuation in place
        #[arg(long)]
        keep_punct: bool,

        /// Leave accents in place
        #[arg(long)]
        keep_accents: bool,

        /// Headers to standardize
        #[arg(required = true)]
        names: Vec<String>,
    },
}
