//! commontools - small helpers shared by data jobs
//!
//! - [`columns`]: spreadsheet column names to numbers and back
//! - [`sqlnames`]: free-form headers to SQL-safe column names

pub mod cli;
pub mod columns;
pub mod sqlnames;

pub use columns::{ColumnError, column_name, column_number};
pub use sqlnames::{NameError, NormalizeOptions, SqlNameNormalizer, standardize};
