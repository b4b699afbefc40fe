//! Statement layout detection from the CSV header row
//!
//! Each known header is described by a [`Signature`]: the columns it must
//! have and the columns it may have. Column names are compared
//! case-insensitively with whitespace removed, in any order. Blank header
//! cells are spacer columns (the legacy export has several) and are ignored.
//!
//! The header only identifies the layout family. Both new-style exports share
//! one header and differ in their date text, so the first data row's book
//! date decides between [`Dialect::NewV1`] and [`Dialect::NewV2`].

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Dialect;

pub(crate) const POSTING_DATE: &str = "Posting Date";
pub(crate) const BOOK_DATE: &str = "Book date";
pub(crate) const DESCRIPTION: &str = "Description";
pub(crate) const DEBIT_AMOUNT: &str = "Debit Amount";
pub(crate) const CREDIT_AMOUNT: &str = "Credit Amount";
pub(crate) const AMOUNT: &str = "Amount";
pub(crate) const INDICATOR: &str = "Credit/debit indicator";
pub(crate) const ACCOUNT_NUMBER: &str = "Account number(BBAN)";

/// Header layouts; the new-style exports share one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    /// Separate debit/credit columns
    Legacy,
    /// Amount plus credit/debit indicator, keyed by book date
    New,
}

impl Family {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::New => "new-format",
        }
    }

    pub(crate) fn of(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Legacy => Self::Legacy,
            Dialect::NewV1 | Dialect::NewV2 => Self::New,
        }
    }
}

/// Column-name set identifying one header layout
struct Signature {
    family: Family,
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    // Posting Date,Description,,Branch,Debit Amount,,Credit Amount,,Running Balance,,Currency,Check Number
    Signature {
        family: Family::Legacy,
        required: &[POSTING_DATE, DESCRIPTION, DEBIT_AMOUNT, CREDIT_AMOUNT],
        optional: &["Branch", "Running Balance", "Currency", "Check Number"],
    },
    // ,Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
    Signature {
        family: Family::New,
        required: &[ACCOUNT_NUMBER, BOOK_DATE, DESCRIPTION, AMOUNT, INDICATOR],
        optional: &[],
    },
];

fn day_first_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}-\d{1,2}-\d{4}$").expect("valid regex"))
}

fn month_name_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{3,9}\.?\s+\d{1,2}\b").expect("valid regex"))
}

/// Canonical form of a column name for comparison
pub(crate) fn column_key(name: &str) -> String {
    name.trim_start_matches('\u{FEFF}')
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Position of a named column in a header row
pub(crate) fn column_index<S: AsRef<str>>(header: &[S], name: &str) -> Option<usize> {
    let key = column_key(name);
    header.iter().position(|cell| column_key(cell.as_ref()) == key)
}

impl Signature {
    fn matches(&self, columns: &[String]) -> bool {
        let required: Vec<String> = self.required.iter().map(|c| column_key(c)).collect();
        let optional: Vec<String> = self.optional.iter().map(|c| column_key(c)).collect();

        required.iter().all(|r| columns.contains(r))
            && columns
                .iter()
                .all(|c| required.contains(c) || optional.contains(c))
    }
}

/// Identify the header layout, failing with [`Error::UnrecognizedFormat`]
/// unless exactly one signature matches
pub(crate) fn header_family<S: AsRef<str>>(header: &[S]) -> Result<Family> {
    let columns: Vec<String> = header
        .iter()
        .map(|cell| column_key(cell.as_ref()))
        .filter(|key| !key.is_empty())
        .collect();

    let unrecognized = || {
        let shown: Vec<&str> = header
            .iter()
            .map(|c| c.as_ref().trim())
            .filter(|c| !c.is_empty())
            .collect();
        Error::UnrecognizedFormat(format!("header [{}]", shown.join(", ")))
    };

    if columns.is_empty() {
        return Err(unrecognized());
    }

    // Repeated names would make column lookup ambiguous
    for (i, column) in columns.iter().enumerate() {
        if columns[..i].contains(column) {
            return Err(unrecognized());
        }
    }

    let mut matched = SIGNATURES.iter().filter(|sig| sig.matches(&columns));
    match (matched.next(), matched.next()) {
        (Some(sig), None) => Ok(sig.family),
        _ => Err(unrecognized()),
    }
}

/// Dialect of a new-style export from the text of one book date.
///
/// Month-name dates (`Mar 31, 2025`) are the first new export; anything else,
/// including no sample at all, is taken as the current `30-06-2025` export
/// and left to strict date parsing.
fn new_format_dialect(book_date: Option<&str>) -> Dialect {
    match book_date.map(str::trim) {
        Some(raw) if month_name_date_re().is_match(raw) => Dialect::NewV1,
        Some(raw) if !raw.is_empty() && !day_first_date_re().is_match(raw) => {
            debug!("Unexpected book date {:?}, assuming {}", raw, Dialect::NewV2);
            Dialect::NewV2
        }
        _ => Dialect::NewV2,
    }
}

/// Detect the statement dialect from a header row and the date cell of the
/// first data row beneath it, if there is one.
///
/// Fails with [`Error::UnrecognizedFormat`] unless exactly one known header
/// signature matches. There is no fallback guessing: a file whose later rows
/// use another date shape fails when those rows are parsed.
pub fn detect<S: AsRef<str>>(header: &[S], first_date: Option<&str>) -> Result<Dialect> {
    Ok(match header_family(header)? {
        Family::Legacy => Dialect::Legacy,
        Family::New => new_format_dialect(first_date),
    })
}
