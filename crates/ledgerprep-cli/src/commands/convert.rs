//! Convert command: explicit statement files for one account

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use ledgerprep_core::batch::write_atomically;
use ledgerprep_core::models::{AccountType, Period};
use ledgerprep_core::{import_file, merge, write_transactions, StatementInput};

use super::display_name;

pub fn cmd_convert(account: AccountType, files: &[PathBuf], output: Option<&Path>) -> Result<bool> {
    let mut inputs = Vec::new();
    let mut failed = 0;

    // Status goes to stderr; stdout may be carrying the CSV
    for file in files {
        match import_file(file, account) {
            Ok(imported) => {
                eprintln!(
                    "✅ {} [{}]: {} transactions",
                    display_name(file),
                    imported.dialect,
                    imported.transactions.len()
                );
                inputs.push(StatementInput {
                    account,
                    transactions: imported.transactions,
                });
            }
            Err(e) => {
                eprintln!("❌ {}: {}", display_name(file), e);
                failed += 1;
            }
        }
    }

    if inputs.is_empty() {
        bail!("No statement could be imported");
    }

    let period = Period::of(Local::now().date_naive());
    let outcome = merge(inputs, &[account], period);

    match output {
        Some(path) => {
            write_atomically(path, &outcome.transactions)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "📝 Wrote {} transactions to {}",
                outcome.transactions.len(),
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            write_transactions(stdout.lock(), &outcome.transactions)
                .context("Failed to write CSV to stdout")?;
        }
    }

    Ok(failed == 0)
}
