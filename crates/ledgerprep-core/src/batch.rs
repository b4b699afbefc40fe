//! Batch processing
//!
//! Two workflows share the same import and write path:
//! - monthly: group statements by month and write one combined import file
//!   per month
//! - per file: write one `<prefix><statement name>` import file per statement
//!
//! Each file is imported independently: a file that fails is reported and the
//! rest still go through.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use crate::backup::create_backup;
use crate::config::Settings;
use crate::discover::{discover, group_by_period, StatementFile, StatementMatcher};
use crate::error::{Error, Result};
use crate::export::write_transactions;
use crate::import::import_file;
use crate::merge::{merge, StatementInput, Warning};
use crate::models::{AccountType, Dialect, Period, Transaction};

/// Options for a batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub matcher: StatementMatcher,
    /// Statements dated before this are ignored
    pub from_date: NaiveDate,
    /// Only process this period
    pub period: Option<Period>,
    pub output_dir: PathBuf,
    pub output_prefix: String,
    pub backup_suffix: String,
    pub expected_accounts: Vec<AccountType>,
    /// Do everything except write files
    pub dry_run: bool,
    /// Overwrite existing outputs after backing them up
    pub force: bool,
}

impl BatchOptions {
    /// Options from resolved settings, with no period filter
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            matcher: settings.matcher()?,
            from_date: settings.min_process_date,
            period: None,
            output_dir: settings.output_dir().to_path_buf(),
            output_prefix: settings.output_prefix.clone(),
            backup_suffix: settings.backup_suffix.clone(),
            expected_accounts: settings.expected_accounts.clone(),
            dry_run: false,
            force: false,
        })
    }
}

/// Outcome of importing one statement file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Imported { dialect: Dialect, transactions: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file_name: String,
    pub account: AccountType,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }
}

/// What happened to a period's output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutputStatus {
    Written {
        path: PathBuf,
        backup: Option<PathBuf>,
    },
    DryRun {
        path: PathBuf,
    },
    /// The output already existed and `force` was not set
    SkippedExisting {
        path: PathBuf,
    },
    /// No file in the period imported successfully
    NotWritten,
    Failed {
        path: PathBuf,
        reason: String,
    },
}

/// Report for one period
#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    pub period: Period,
    pub files: Vec<FileReport>,
    pub transactions: usize,
    pub warnings: Vec<Warning>,
    pub output: OutputStatus,
}

impl PeriodReport {
    pub fn files_imported(&self) -> usize {
        self.files.iter().filter(|f| !f.is_failed()).count()
    }

    pub fn files_failed(&self) -> usize {
        self.files.iter().filter(|f| f.is_failed()).count()
    }

    /// True when any file or the output write failed
    pub fn has_failures(&self) -> bool {
        self.files_failed() > 0 || matches!(self.output, OutputStatus::Failed { .. })
    }
}

/// Report for a whole batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub periods: Vec<PeriodReport>,
}

impl BatchReport {
    pub fn files_found(&self) -> usize {
        self.periods.iter().map(|p| p.files.len()).sum()
    }

    pub fn files_imported(&self) -> usize {
        self.periods.iter().map(PeriodReport::files_imported).sum()
    }

    pub fn files_failed(&self) -> usize {
        self.periods.iter().map(PeriodReport::files_failed).sum()
    }

    pub fn transactions(&self) -> usize {
        self.periods.iter().map(|p| p.transactions).sum()
    }

    pub fn outputs_written(&self) -> usize {
        self.periods
            .iter()
            .filter(|p| matches!(p.output, OutputStatus::Written { .. }))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.periods.iter().any(PeriodReport::has_failures)
    }

    /// True when no statement file was imported
    pub fn is_empty(&self) -> bool {
        self.files_imported() == 0
    }
}

/// Report for one statement converted on its own
#[derive(Debug, Clone, Serialize)]
pub struct StatementReport {
    #[serde(flatten)]
    pub file: FileReport,
    pub output: OutputStatus,
}

impl StatementReport {
    pub fn has_failures(&self) -> bool {
        self.file.is_failed() || matches!(self.output, OutputStatus::Failed { .. })
    }
}

/// Report for a per-file run
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatementsReport {
    pub statements: Vec<StatementReport>,
}

impl StatementsReport {
    pub fn files_found(&self) -> usize {
        self.statements.len()
    }

    pub fn files_imported(&self) -> usize {
        self.statements.iter().filter(|s| !s.file.is_failed()).count()
    }

    pub fn files_failed(&self) -> usize {
        self.statements.iter().filter(|s| s.file.is_failed()).count()
    }

    pub fn transactions(&self) -> usize {
        self.statements
            .iter()
            .map(|s| match s.file.status {
                FileStatus::Imported { transactions, .. } => transactions,
                FileStatus::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn outputs_written(&self) -> usize {
        self.statements
            .iter()
            .filter(|s| matches!(s.output, OutputStatus::Written { .. }))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.statements.iter().any(StatementReport::has_failures)
    }

    /// True when no statement file was imported
    pub fn is_empty(&self) -> bool {
        self.files_imported() == 0
    }
}

/// Output file name for a period: `<prefix>My_Transactions BDO <last day>.csv`
pub fn output_file_name(period: Period, prefix: &str) -> String {
    format!(
        "{}My_Transactions BDO {}.csv",
        prefix,
        period.last_day().format("%Y-%m-%d")
    )
}

/// Full output path for a period
pub fn output_path(period: Period, options: &BatchOptions) -> PathBuf {
    options
        .output_dir
        .join(output_file_name(period, &options.output_prefix))
}

/// Output path for a statement converted on its own: `<prefix><file name>`,
/// in `output_dir` or else next to the statement
pub fn statement_output_path(
    file: &StatementFile,
    prefix: &str,
    output_dir: Option<&Path>,
) -> PathBuf {
    let dir = output_dir
        .or_else(|| file.path.parent())
        .unwrap_or_else(|| Path::new("."));
    dir.join(format!("{}{}", prefix, file.file_name))
}

/// Import one statement file, returning its merge input on success
fn import_one(file: &StatementFile) -> (Option<StatementInput>, FileReport) {
    info!("Processing file: {}", file.file_name);
    let (input, status) = match import_file(&file.path, file.account) {
        Ok(imported) => {
            let status = FileStatus::Imported {
                dialect: imported.dialect,
                transactions: imported.transactions.len(),
            };
            let input = StatementInput {
                account: file.account,
                transactions: imported.transactions,
            };
            (Some(input), status)
        }
        Err(e) => {
            error!("Failed to import {}: {}", file.file_name, e);
            (
                None,
                FileStatus::Failed {
                    reason: e.to_string(),
                },
            )
        }
    };
    let report = FileReport {
        file_name: file.file_name.clone(),
        account: file.account,
        status,
    };
    (input, report)
}

/// Import each file, recording successes as merge inputs and every outcome
/// as a file report
pub fn import_inputs(files: &[StatementFile]) -> (Vec<StatementInput>, Vec<FileReport>) {
    let mut inputs = Vec::new();
    let mut reports = Vec::new();

    for file in files {
        let (input, report) = import_one(file);
        inputs.extend(input);
        reports.push(report);
    }

    (inputs, reports)
}

/// Write transactions to `path` via a temp file in the same directory
pub fn write_atomically(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    write_transactions(tmp.as_file_mut(), transactions)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn backup_and_write(
    path: &Path,
    exists: bool,
    transactions: &[Transaction],
    options: &BatchOptions,
) -> Result<Option<PathBuf>> {
    let backup = if exists {
        create_backup(path, &options.backup_suffix, Local::now().naive_local())?
    } else {
        None
    };
    write_atomically(path, transactions)?;
    Ok(backup)
}

fn write_output(
    path: &Path,
    transactions: &[Transaction],
    options: &BatchOptions,
) -> OutputStatus {
    let exists = path.exists();
    if exists && !options.force {
        warn!(
            "Output {} already exists, skipping (use --force to overwrite)",
            path.display()
        );
        return OutputStatus::SkippedExisting {
            path: path.to_path_buf(),
        };
    }

    if options.dry_run {
        info!(
            "DRY RUN: would write {} transactions to {}",
            transactions.len(),
            path.display()
        );
        return OutputStatus::DryRun {
            path: path.to_path_buf(),
        };
    }

    let result = backup_and_write(path, exists, transactions, options);

    match result {
        Ok(backup) => {
            info!(
                "Wrote {} transactions to {}",
                transactions.len(),
                path.display()
            );
            OutputStatus::Written {
                path: path.to_path_buf(),
                backup,
            }
        }
        Err(e) => {
            error!("Failed to write {}: {}", path.display(), e);
            OutputStatus::Failed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    }
}

/// Import, merge and write one period's statements
pub fn process_period(
    period: Period,
    files: &[StatementFile],
    options: &BatchOptions,
) -> PeriodReport {
    info!(
        "Processing {} ({} files)",
        period.display_name(),
        files.len()
    );

    let (inputs, file_reports) = import_inputs(files);
    let any_imported = !inputs.is_empty();
    let outcome = merge(inputs, &options.expected_accounts, period);

    let output = if any_imported {
        write_output(
            &output_path(period, options),
            &outcome.transactions,
            options,
        )
    } else {
        warn!("No statements imported for {}, nothing written", period);
        OutputStatus::NotWritten
    };

    PeriodReport {
        period,
        files: file_reports,
        transactions: outcome.transactions.len(),
        warnings: outcome.warnings,
        output,
    }
}

/// Discover statements in `dir` and process every period in order
pub fn process_all(dir: &Path, options: &BatchOptions) -> Result<BatchReport> {
    let files = discover(dir, &options.matcher, options.from_date)?;
    let mut groups = group_by_period(files);

    if let Some(period) = options.period {
        groups.retain(|p, _| *p == period);
        if groups.is_empty() {
            warn!("No statement files found for {}", period.display_name());
        }
    }

    let periods = groups
        .iter()
        .map(|(period, files)| process_period(*period, files, options))
        .collect();

    Ok(BatchReport { periods })
}

/// Import one statement and write its own import file
pub fn process_statement(
    file: &StatementFile,
    options: &BatchOptions,
    output_dir: Option<&Path>,
) -> StatementReport {
    let (input, report) = import_one(file);

    let output = match input {
        Some(input) => {
            let outcome = merge(vec![input], &[file.account], file.period());
            write_output(
                &statement_output_path(file, &options.output_prefix, output_dir),
                &outcome.transactions,
                options,
            )
        }
        None => OutputStatus::NotWritten,
    };

    StatementReport {
        file: report,
        output,
    }
}

/// Convert each statement to its own import file.
///
/// `output_dir` of `None` writes each import file next to its statement.
pub fn process_statements(
    files: &[StatementFile],
    options: &BatchOptions,
    output_dir: Option<&Path>,
) -> StatementsReport {
    let statements = files
        .iter()
        .map(|file| process_statement(file, options, output_dir))
        .collect();
    StatementsReport { statements }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            FileStatus::Imported {
                dialect,
                transactions,
            } => write!(
                f,
                "ok     {} [{}, {}]: {} transactions",
                self.file_name, self.account, dialect, transactions
            ),
            FileStatus::Failed { reason } => write!(
                f,
                "FAILED {} [{}]: {}",
                self.file_name, self.account, reason
            ),
        }
    }
}

impl fmt::Display for OutputStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written { path, backup } => {
                write!(f, "wrote {}", path.display())?;
                if let Some(backup) = backup {
                    write!(f, " (previous saved as {})", backup.display())?;
                }
                Ok(())
            }
            Self::DryRun { path } => write!(f, "dry run, would write {}", path.display()),
            Self::SkippedExisting { path } => write!(
                f,
                "skipped, {} already exists (use --force to overwrite)",
                path.display()
            ),
            Self::NotWritten => write!(f, "not written, no statement imported"),
            Self::Failed { path, reason } => {
                write!(f, "FAILED to write {}: {}", path.display(), reason)
            }
        }
    }
}

impl fmt::Display for PeriodReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}): {} imported, {} failed, {} transactions",
            self.period.display_name(),
            self.period,
            self.files_imported(),
            self.files_failed(),
            self.transactions
        )?;
        for file in &self.files {
            writeln!(f, "  {}", file)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning)?;
        }
        writeln!(f, "  output: {}", self.output)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.periods.is_empty() {
            return writeln!(f, "No statement files to process.");
        }
        for period in &self.periods {
            writeln!(f, "{}", period)?;
        }
        writeln!(
            f,
            "Total: {} files found, {} imported, {} failed, {} transactions, {} outputs written",
            self.files_found(),
            self.files_imported(),
            self.files_failed(),
            self.transactions(),
            self.outputs_written()
        )
    }
}

impl fmt::Display for StatementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.file)?;
        writeln!(f, "  output: {}", self.output)
    }
}

impl fmt::Display for StatementsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return writeln!(f, "No statement files to process.");
        }
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        writeln!(
            f,
            "Total: {} files found, {} imported, {} failed, {} transactions, {} outputs written",
            self.files_found(),
            self.files_imported(),
            self.files_failed(),
            self.transactions(),
            self.outputs_written()
        )
    }
}
