//! Ledgerprep Core Library
//!
//! Turns BDO bank CSV statement exports into one import-ready CSV per month:
//! - Statement discovery from the bank's file naming
//! - Format detection across the legacy and new export layouts
//! - Per-dialect row parsing with trailer/footer handling
//! - Normalization to debit/credit transactions with ledger accounts
//! - Merging checking and savings statements in date order
//! - Monthly and per-statement batch processing with atomic writes and backups

pub mod backup;
pub mod batch;
pub mod config;
pub mod discover;
pub mod error;
pub mod export;
pub mod import;
pub mod merge;
pub mod models;
pub mod normalize;

/// Fixture statements for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use batch::{
    process_all, process_period, process_statement, process_statements, BatchOptions,
    BatchReport, FileReport, FileStatus, OutputStatus, PeriodReport, StatementReport,
    StatementsReport,
};
pub use config::Settings;
pub use discover::{discover, group_by_period, StatementFile, StatementMatcher};
pub use error::{Error, Result};
pub use export::{to_csv_string, write_transactions, IMPORT_HEADER};
pub use import::{detect, detect_content, import_file, import_statement, parse, ImportedStatement};
pub use merge::{merge, MergeOutcome, StatementInput, Warning};
pub use models::{AccountType, Amount, Dialect, Period, RawRow, Transaction};
pub use normalize::normalize;
