//! Error types for ledgerprep

use thiserror::Error;

use crate::models::Dialect;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unrecognized statement format: {0}")]
    UnrecognizedFormat(String),

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Unable to parse {dialect} date {raw:?} at line {line}")]
    DateParse {
        line: u64,
        raw: String,
        dialect: Dialect,
    },

    #[error("Invalid amount at line {line}: {reason}")]
    InvalidAmount { line: u64, reason: String },

    #[error("Not a statement file name: {0}")]
    UnrecognizedFileName(String),

    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Backup error: {0}")]
    Backup(String),
}

pub type Result<T> = std::result::Result<T, Error>;
