//! Per-file command: one import file per statement

use std::path::PathBuf;

use anyhow::{Context, Result};
use ledgerprep_core::{discover, process_statements, BatchOptions, Settings};

pub fn cmd_per_file(
    settings: &Settings,
    files: &[PathBuf],
    dry_run: bool,
    force: bool,
    json: bool,
) -> Result<bool> {
    let mut options = BatchOptions::from_settings(settings).context("Invalid settings")?;
    options.dry_run = dry_run;
    options.force = force;

    let statements = if files.is_empty() {
        if !json {
            println!(
                "📂 Processing statements in {}...",
                settings.input_dir.display()
            );
        }
        discover(&settings.input_dir, &options.matcher, options.from_date).with_context(|| {
            format!(
                "Failed to list statements in {}",
                settings.input_dir.display()
            )
        })?
    } else {
        options
            .matcher
            .resolve(files)
            .context("Statement files must keep the bank's file naming")?
    };

    if !json {
        if dry_run {
            println!("   DRY RUN: no files will be written");
        }
        println!();
    }

    let report = process_statements(&statements, &options, settings.output_dir.as_deref());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
        println!();
        if report.is_empty() {
            println!("⚠️  Nothing was processed");
        } else if report.has_failures() {
            println!("❌ Completed with failures");
        } else {
            println!("✅ Done!");
        }
    }

    Ok(!report.is_empty() && !report.has_failures())
}
