//! Settings for statement discovery and output
//!
//! ## Configuration Resolution
//!
//! Settings are loaded with a layered resolution:
//! 1. An explicit path (the CLI's `--config`)
//! 2. An override in the config dir (~/.config/ledgerprep/config.toml)
//! 3. The embedded defaults (compiled into binary)
//!
//! Keys missing from a file keep their default values.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::backup::DEFAULT_BACKUP_SUFFIX;
use crate::discover::{StatementMatcher, DEFAULT_FILE_PATTERN};
use crate::error::{Error, Result};
use crate::models::AccountType;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Prefix for combined import files
pub const DEFAULT_OUTPUT_PREFIX: &str = "for_import_";

/// Resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the bank's CSV exports
    pub input_dir: PathBuf,
    /// Directory for combined import files; `None` means the input directory
    pub output_dir: Option<PathBuf>,
    /// Statements dated before this are ignored
    pub min_process_date: NaiveDate,
    pub output_prefix: String,
    pub backup_suffix: String,
    pub file_pattern: String,
    /// Accounts that should have a statement every period
    pub expected_accounts: Vec<AccountType>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: None,
            min_process_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            expected_accounts: AccountType::all().to_vec(),
        }
    }
}

impl Settings {
    /// Load settings, preferring `path`, then the user override, then defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                read_config(path)?
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Loading settings override from {}", path.display());
                    read_config(&path)?
                }
                None => DEFAULT_CONFIG.to_string(),
            },
        };
        Self::parse(&content)
    }

    /// Parse settings from TOML content over the built-in defaults
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        let mut settings = Settings::default();

        if let Some(input) = raw.input {
            if let Some(dir) = input.dir {
                settings.input_dir = dir;
            }
            if let Some(pattern) = input.file_pattern {
                settings.file_pattern = pattern;
            }
            if let Some(date) = input.min_process_date {
                settings.min_process_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|_| {
                        Error::Config(format!(
                            "min_process_date must be YYYY-MM-DD, got {:?}",
                            date
                        ))
                    })?;
            }
            if let Some(accounts) = input.expected_accounts {
                settings.expected_accounts = accounts
                    .iter()
                    .map(|a| a.parse::<AccountType>())
                    .collect::<Result<Vec<_>>>()?;
            }
        }

        if let Some(output) = raw.output {
            if output.dir.is_some() {
                settings.output_dir = output.dir;
            }
            if let Some(prefix) = output.prefix {
                settings.output_prefix = prefix;
            }
            if let Some(suffix) = output.backup_suffix {
                settings.backup_suffix = suffix;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        self.matcher()?;
        if self.output_prefix.is_empty() {
            return Err(Error::Config(
                "output prefix must not be empty (outputs would overwrite inputs)".into(),
            ));
        }
        if self.output_prefix.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "output prefix must not contain path separators: {:?}",
                self.output_prefix
            )));
        }
        Ok(())
    }

    /// Compiled statement filename matcher
    pub fn matcher(&self) -> Result<StatementMatcher> {
        StatementMatcher::new(&self.file_pattern)
    }

    /// Directory outputs are written to
    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.input_dir)
    }
}

/// Default settings override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ledgerprep").join("config.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    input: Option<RawInput>,
    output: Option<RawOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInput {
    dir: Option<PathBuf>,
    file_pattern: Option<String>,
    min_process_date: Option<String>,
    expected_accounts: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    dir: Option<PathBuf>,
    prefix: Option<String>,
    backup_suffix: Option<String>,
}
