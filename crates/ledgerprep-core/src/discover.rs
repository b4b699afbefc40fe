//! Statement file discovery
//!
//! Bank exports are named like
//! `My_Transactions BDO Checking 007310159087 2024-02-29.csv`; the account
//! type, account number and statement date all come from the file name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{AccountType, Period};

/// Default statement filename pattern: account type, account number, date
pub const DEFAULT_FILE_PATTERN: &str =
    r"^My_Transactions BDO (Checking|Savings) (\d+) (\d{4}-\d{2}-\d{2})\.csv$";

/// A statement export found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFile {
    pub path: PathBuf,
    pub file_name: String,
    pub account: AccountType,
    pub account_number: String,
    pub statement_date: NaiveDate,
}

impl StatementFile {
    /// The month this statement belongs to
    pub fn period(&self) -> Period {
        Period::of(self.statement_date)
    }
}

/// Outcome of matching one file name
#[derive(Debug, PartialEq, Eq)]
enum NameMatch {
    Statement {
        account: AccountType,
        account_number: String,
        statement_date: NaiveDate,
    },
    NotAStatement,
    Invalid(String),
}

/// Compiled statement filename pattern
#[derive(Debug, Clone)]
pub struct StatementMatcher {
    pattern: Regex,
}

impl StatementMatcher {
    /// Compile a filename pattern.
    ///
    /// The pattern must have exactly three capture groups: account type,
    /// account number and statement date (`YYYY-MM-DD`).
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        let groups = pattern.captures_len() - 1;
        if groups != 3 {
            return Err(Error::Config(format!(
                "file pattern must have 3 capture groups (account type, account number, date), found {}",
                groups
            )));
        }
        Ok(Self { pattern })
    }

    fn match_name(&self, file_name: &str) -> NameMatch {
        let Some(caps) = self.pattern.captures(file_name) else {
            return NameMatch::NotAStatement;
        };
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();

        let account = match group(1).parse::<AccountType>() {
            Ok(account) => account,
            Err(e) => return NameMatch::Invalid(e.to_string()),
        };
        let statement_date = match NaiveDate::parse_from_str(group(3), "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => return NameMatch::Invalid(format!("invalid date {:?}", group(3))),
        };

        NameMatch::Statement {
            account,
            account_number: group(2).to_string(),
            statement_date,
        }
    }

    /// Build a [`StatementFile`] for a path whose name matches the pattern
    pub fn statement_file(&self, path: &Path) -> Option<StatementFile> {
        let file_name = path.file_name()?.to_str()?;
        match self.match_name(file_name) {
            NameMatch::Statement {
                account,
                account_number,
                statement_date,
            } => Some(StatementFile {
                path: path.to_path_buf(),
                file_name: file_name.to_string(),
                account,
                account_number,
                statement_date,
            }),
            NameMatch::NotAStatement => None,
            NameMatch::Invalid(reason) => {
                warn!("Skipping {}: {}", file_name, reason);
                None
            }
        }
    }

    /// Statement files for explicitly named paths, in the order given.
    ///
    /// Every name must match the pattern; the account type comes from it.
    pub fn resolve(&self, paths: &[PathBuf]) -> Result<Vec<StatementFile>> {
        paths
            .iter()
            .map(|path| {
                self.statement_file(path)
                    .ok_or_else(|| Error::UnrecognizedFileName(path.display().to_string()))
            })
            .collect()
    }
}

impl Default for StatementMatcher {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_FILE_PATTERN).expect("valid regex"),
        }
    }
}

/// List statement files in `dir` dated on or after `from_date`.
///
/// Results are ordered by statement date, then file name.
pub fn discover(
    dir: &Path,
    matcher: &StatementMatcher,
    from_date: NaiveDate,
) -> Result<Vec<StatementFile>> {
    if !dir.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input directory not found: {}", dir.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match matcher.statement_file(&path) {
            Some(file) if file.statement_date >= from_date => {
                debug!("Found statement: {}", file.file_name);
                files.push(file);
            }
            Some(file) => debug!("Skipping {} (before {})", file.file_name, from_date),
            None => debug!("Ignoring {}", path.display()),
        }
    }

    files.sort_by(|a, b| {
        a.statement_date
            .cmp(&b.statement_date)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });

    info!("Discovered {} statement files in {}", files.len(), dir.display());
    Ok(files)
}

/// Group statement files by period, keeping their order within each period
pub fn group_by_period(files: Vec<StatementFile>) -> BTreeMap<Period, Vec<StatementFile>> {
    let mut groups: BTreeMap<Period, Vec<StatementFile>> = BTreeMap::new();
    for file in files {
        groups.entry(file.period()).or_default().push(file);
    }
    groups
}
