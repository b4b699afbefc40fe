//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ledgerprep_core::models::{AccountType, Period};

/// Ledgerprep - BDO statements in, ledger import files out
#[derive(Parser)]
#[command(name = "ledgerprep")]
#[command(about = "Convert BDO bank CSV statements into ledger import files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Settings file
    ///
    /// Defaults to ~/.config/ledgerprep/config.toml when present,
    /// otherwise the built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also append log output to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Combine each month's statements into one import file
    Monthly {
        /// Directory holding the statement exports (overrides settings)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Directory for import files (defaults to the input directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Only process this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<Period>,

        /// Ignore statements dated before this day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Show what would be written without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Overwrite existing import files (a timestamped backup is kept)
        #[arg(long)]
        force: bool,

        /// Print the processing report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write one import file per statement, named after the statement
    PerFile {
        /// Statement files to convert; the account type comes from each file
        /// name (default: every statement in the input directory)
        files: Vec<PathBuf>,

        /// Directory holding the statement exports (overrides settings)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Directory for import files (defaults to next to each statement)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Ignore discovered statements dated before this day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Show what would be written without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Overwrite existing import files (a timestamped backup is kept)
        #[arg(long)]
        force: bool,

        /// Print the processing report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert statement files for one account into a single import file
    Convert {
        /// Account the statements belong to: checking, savings
        #[arg(short, long)]
        account: AccountType,

        /// Statement CSV files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show which statement layout each file uses
    Detect {
        /// Statement CSV files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}
