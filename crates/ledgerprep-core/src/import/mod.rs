//! Statement import: decode bytes, find the header, parse rows, normalize
//!
//! A statement file goes through these stages:
//! 1. [`decode`] turns raw bytes into text (UTF-8, or Windows-1252 fallback)
//! 2. the first row matching a known header signature becomes the header,
//!    and [`detect()`] names the dialect
//! 3. [`parse()`] reads the data rows for that dialect
//! 4. [`crate::normalize::normalize_all`] turns them into transactions

mod detect;
mod parse;

pub use detect::detect;
pub use parse::{detect_content, parse};

use std::borrow::Cow;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{AccountType, Dialect, Transaction};
use crate::normalize::normalize_all;

/// Decode statement bytes to text.
///
/// Valid UTF-8 is used as-is with any byte-order mark removed. Anything else
/// is decoded as Windows-1252, which maps every byte.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            debug!("Statement is not valid UTF-8, decoding as Windows-1252");
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text
        }
    }
}

/// Detect the dialect of a statement file on disk
pub fn detect_file(path: &Path) -> Result<Dialect> {
    let bytes = std::fs::read(path)?;
    detect_content(&decode(&bytes))
}

/// One statement after import
#[derive(Debug, Clone)]
pub struct ImportedStatement {
    pub dialect: Dialect,
    pub transactions: Vec<Transaction>,
}

/// Import statement text for a known account type
pub fn import_statement(content: &str, account: AccountType) -> Result<ImportedStatement> {
    let dialect = detect_content(content)?;
    let rows = parse(content, dialect)?;
    let transactions = normalize_all(rows, account)?;

    debug!(
        "Imported {} {} transactions ({})",
        transactions.len(),
        account,
        dialect
    );

    Ok(ImportedStatement {
        dialect,
        transactions,
    })
}

/// Read, decode and import a statement file
pub fn import_file(path: &Path, account: AccountType) -> Result<ImportedStatement> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    import_statement(&decode(&bytes), account)
}
