//! Ledgerprep CLI - BDO statement to ledger import converter
//!
//! Usage:
//!   ledgerprep monthly                         Combine each month's statements
//!   ledgerprep monthly --month 2024-02 --force Rebuild one month's import file
//!   ledgerprep per-file                        One import file per statement
//!   ledgerprep convert --account savings FILE  Convert files for one account
//!   ledgerprep detect FILE...                  Show each file's layout

mod cli;
mod commands;


use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use ledgerprep_core::Settings;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    let ok = match cli.command {
        Commands::Monthly {
            input_dir,
            output_dir,
            month,
            from,
            dry_run,
            force,
            json,
        } => {
            let settings = with_overrides(settings, input_dir, output_dir, from);
            commands::cmd_monthly(&settings, month, dry_run, force, json)?
        }
        Commands::PerFile {
            files,
            input_dir,
            output_dir,
            from,
            dry_run,
            force,
            json,
        } => {
            let settings = with_overrides(settings, input_dir, output_dir, from);
            commands::cmd_per_file(&settings, &files, dry_run, force, json)?
        }
        Commands::Convert {
            account,
            files,
            output,
        } => commands::cmd_convert(account, &files, output.as_deref())?,
        Commands::Detect { files } => commands::cmd_detect(&files)?,
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Apply command-line overrides on top of loaded settings
fn with_overrides(
    mut settings: Settings,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    from: Option<NaiveDate>,
) -> Settings {
    if let Some(dir) = input_dir {
        settings.input_dir = dir;
    }
    if output_dir.is_some() {
        settings.output_dir = output_dir;
    }
    if let Some(from) = from {
        settings.min_process_date = from;
    }
    settings
}

/// Set up logging
///
/// Priority: RUST_LOG env var > --verbose flag > default (info).
/// Logs go to stderr so `convert` can write CSV to stdout.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}
