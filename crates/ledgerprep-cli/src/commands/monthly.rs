//! Monthly batch command

use anyhow::{Context, Result};
use ledgerprep_core::models::Period;
use ledgerprep_core::{process_all, BatchOptions, Settings};

pub fn cmd_monthly(
    settings: &Settings,
    month: Option<Period>,
    dry_run: bool,
    force: bool,
    json: bool,
) -> Result<bool> {
    let mut options = BatchOptions::from_settings(settings).context("Invalid settings")?;
    options.period = month;
    options.dry_run = dry_run;
    options.force = force;

    if !json {
        println!(
            "📂 Processing statements in {}...",
            settings.input_dir.display()
        );
        if dry_run {
            println!("   DRY RUN: no files will be written");
        }
        println!();
    }

    let report = process_all(&settings.input_dir, &options).with_context(|| {
        format!(
            "Failed to process statements in {}",
            settings.input_dir.display()
        )
    })?;

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
