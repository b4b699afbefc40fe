//! Row parsing for each statement dialect
//!
//! Columns are located by header name, so a dialect tolerates reordering
//! within its signature. Trailer and footer rows the bank appends (page
//! markers, totals, "End of Report") are skipped rather than treated as data.

use std::sync::OnceLock;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::detect::{self, column_index, Family};
use crate::error::{Error, Result};
use crate::models::{Dialect, RawRow};

/// Labels that start summary rows beneath the transaction table
const SUMMARY_LABELS: &[&str] = &[
    "total",
    "running balance",
    "ending balance",
    "beginning balance",
    "balance",
];

fn page_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^page\s+\d+\s+of\s+\d+$").expect("valid regex"))
}

fn split_month_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{3,9}\s+\d{1,2}$").expect("valid regex"))
}

fn split_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d{4}\s*$").expect("valid regex"))
}

/// Date formats accepted per dialect, tried in order
fn date_formats(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::Legacy => &["%b %d, %Y"],             // Feb 29, 2024
        Dialect::NewV1 => &["%b %d, %Y", "%B %d, %Y"], // Mar 31, 2025 / March 31, 2025
        Dialect::NewV2 => &["%d-%m-%Y"],               // 30-06-2025
    }
}

/// Where the money is in a row
#[derive(Debug, Clone, Copy)]
enum Layout {
    /// Separate debit and credit columns
    Split { debit: usize, credit: usize },
    /// One amount column plus a credit/debit indicator
    Indicator { amount: usize, indicator: usize },
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    description: usize,
    layout: Layout,
    width: usize,
}

impl Columns {
    fn locate(header: &StringRecord, family: Family) -> Result<Self> {
        let cells: Vec<&str> = header.iter().collect();
        let find = |name: &str| {
            column_index(&cells, name).ok_or_else(|| {
                Error::UnrecognizedFormat(format!(
                    "{} header has no {:?} column",
                    family.as_str(),
                    name
                ))
            })
        };

        let (date, layout) = match family {
            Family::Legacy => (
                find(detect::POSTING_DATE)?,
                Layout::Split {
                    debit: find(detect::DEBIT_AMOUNT)?,
                    credit: find(detect::CREDIT_AMOUNT)?,
                },
            ),
            Family::New => (
                find(detect::BOOK_DATE)?,
                Layout::Indicator {
                    amount: find(detect::AMOUNT)?,
                    indicator: find(detect::INDICATOR)?,
                },
            ),
        };

        Ok(Self {
            date,
            description: find(detect::DESCRIPTION)?,
            layout,
            width: header.len(),
        })
    }
}

/// What a record below the header represents
#[derive(Debug, PartialEq, Eq)]
enum RowKind {
    Data,
    Skip,
    EndOfReport,
}

/// Report markers the bank prints in a single cell
fn marker(cell: &str) -> Option<RowKind> {
    let lower = cell.to_lowercase();
    if lower.contains("end of report") {
        Some(RowKind::EndOfReport)
    } else if lower.starts_with("generated on") || page_marker_re().is_match(cell) {
        Some(RowKind::Skip)
    } else {
        None
    }
}

fn classify(record: &StringRecord, date_column: usize) -> RowKind {
    let cells: Vec<&str> = record.iter().map(str::trim).collect();

    if cells.iter().all(|c| c.is_empty()) {
        return RowKind::Skip;
    }

    // A dated row is a transaction unless the date cell itself is a marker
    match cells.get(date_column).filter(|c| !c.is_empty()) {
        Some(date) => marker(date).unwrap_or(RowKind::Data),
        None => {
            if let Some(kind) = cells.iter().find_map(|c| marker(c)) {
                return kind;
            }
            let first = cells
                .iter()
                .find(|c| !c.is_empty())
                .map(|c| c.to_lowercase())
                .unwrap_or_default();
            if SUMMARY_LABELS.iter().any(|label| first.starts_with(label)) {
                RowKind::Skip
            } else {
                RowKind::Data
            }
        }
    }
}

/// Re-join a `Mon D, YYYY` date the CSV reader split on its comma.
///
/// Only applies when the record is exactly one field wider than the header.
fn repair_unquoted_date(record: &StringRecord, columns: &Columns) -> Option<Vec<String>> {
    if record.len() != columns.width + 1 {
        return None;
    }
    let month_day = record.get(columns.date)?.trim();
    let year = record.get(columns.date + 1)?;
    if !split_month_day_re().is_match(month_day) || !split_year_re().is_match(year) {
        return None;
    }

    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
    fields[columns.date] = format!("{}, {}", month_day, year.trim());
    fields.remove(columns.date + 1);
    Some(fields)
}

/// Consume records until one is accepted as a statement header.
///
/// Rows above the header (account number, period covered, ...) are skipped.
fn find_header<I>(records: &mut I) -> Result<(StringRecord, Family)>
where
    I: Iterator<Item = csv::Result<StringRecord>>,
{
    for result in records {
        let record = result?;
        let cells: Vec<&str> = record.iter().collect();
        if let Ok(family) = detect::header_family(&cells) {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            debug!("Found {} header at line {}", family.as_str(), line);
            return Ok((record, family));
        }
    }
    Err(Error::UnrecognizedFormat(
        "no recognized header row found".to_string(),
    ))
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
}

/// Detect the dialect of statement content.
///
/// Preamble rows are skipped to find the header. For new-style headers the
/// book date of the first data row picks the dialect.
pub fn detect_content(content: &str) -> Result<Dialect> {
    let mut rdr = reader(content);
    let mut records = rdr.records();

    let (header, family) = find_header(&mut records)?;
    let cells: Vec<&str> = header.iter().collect();
    if family == Family::Legacy {
        return detect::detect(&cells, None);
    }

    let columns = Columns::locate(&header, family)?;
    for result in records {
        let record = result?;
        match classify(&record, columns.date) {
            RowKind::Data => return detect::detect(&cells, record.get(columns.date)),
            RowKind::Skip => continue,
            RowKind::EndOfReport => break,
        }
    }
    detect::detect(&cells, None)
}

fn parse_date(raw: &str, dialect: Dialect, line: u64) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    date_formats(dialect)
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| Error::DateParse {
            line,
            raw: raw.to_string(),
            dialect,
        })
}

/// Parse an amount cell: blank is absent, thousands separators are ignored
fn parse_amount(raw: &str, column: &str, line: u64) -> Result<Option<Decimal>> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return Ok(None);
    }
    Decimal::from_str_exact(&cleaned)
        .map(Some)
        .map_err(|_| Error::MalformedRow {
            line,
            reason: format!("{} is not a number: {:?}", column, raw),
        })
}

fn parse_row(fields: &[&str], columns: &Columns, dialect: Dialect, line: u64) -> Result<RawRow> {
    let get = |index: usize, name: &str| {
        fields.get(index).copied().ok_or_else(|| Error::MalformedRow {
            line,
            reason: format!("missing {} column", name),
        })
    };

    let date_name = match dialect {
        Dialect::Legacy => detect::POSTING_DATE,
        Dialect::NewV1 | Dialect::NewV2 => detect::BOOK_DATE,
    };
    let date = parse_date(get(columns.date, date_name)?, dialect, line)?;
    let description = get(columns.description, detect::DESCRIPTION)?.trim().to_string();

    let (debit, credit) = match columns.layout {
        Layout::Split { debit, credit } => (
            parse_amount(get(debit, detect::DEBIT_AMOUNT)?, detect::DEBIT_AMOUNT, line)?,
            parse_amount(get(credit, detect::CREDIT_AMOUNT)?, detect::CREDIT_AMOUNT, line)?,
        ),
        Layout::Indicator { amount, indicator } => {
            let value = parse_amount(get(amount, detect::AMOUNT)?, detect::AMOUNT, line)?;
            let flag = get(indicator, detect::INDICATOR)?;
            match flag.trim().to_lowercase().as_str() {
                "debit" => (value, None),
                "credit" => (None, value),
                _ => {
                    return Err(Error::MalformedRow {
                        line,
                        reason: format!("unknown credit/debit indicator {:?}", flag),
                    })
                }
            }
        }
    };

    Ok(RawRow {
        line,
        dialect,
        date,
        description,
        debit,
        credit,
    })
}

/// Parse statement content in a known dialect into raw rows.
///
/// The content may carry preamble rows above the header; the first row the
/// detector accepts is taken as the header and must belong to `dialect`.
pub fn parse(content: &str, dialect: Dialect) -> Result<Vec<RawRow>> {
    let mut rdr = reader(content);
    let mut records = rdr.records();

    let (header, found) = find_header(&mut records)?;
    if found != Family::of(dialect) {
        return Err(Error::UnrecognizedFormat(format!(
            "expected a {} header, found a {} header",
            dialect,
            found.as_str()
        )));
    }
    let columns = Columns::locate(&header, found)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in records {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        match classify(&record, columns.date) {
            RowKind::Data => {}
            RowKind::Skip => {
                skipped += 1;
                continue;
            }
            RowKind::EndOfReport => {
                debug!("End of report marker at line {}", line);
                break;
            }
        }

        let repaired = repair_unquoted_date(&record, &columns);
        let fields: Vec<&str> = match &repaired {
            Some(fields) => {
                debug!("Re-joined unquoted date at line {}", line);
                fields.iter().map(String::as_str).collect()
            }
            None => record.iter().collect(),
        };

        if fields.len() != columns.width {
            return Err(Error::MalformedRow {
                line,
                reason: format!(
                    "expected {} fields, found {}",
                    columns.width,
                    fields.len()
                ),
            });
        }

        rows.push(parse_row(&fields, &columns, dialect, line)?);
    }

    debug!(
        "Parsed {} {} rows ({} trailer rows skipped)",
        rows.len(),
        dialect,
        skipped
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const LEGACY: &str = "\
Account No:,,007310159087,,,,,,,,,
Period Covered:,,02/01/2024 - 02/29/2024,,,,,,,,,
Posting Date,Description,,Branch,Debit Amount,,Credit Amount,,Running Balance,,Currency,Check Number
\"Feb 29, 2024\",INTEREST WITHHELD,, ,0.55,,,,\"55,677.05\",,PHP,
\"Feb 29, 2024\",INTEREST PAY SYS-GEN,, ,,,2.77,,\"55,679.82\",,PHP,
,,,,,,,,,,Page 1 of 1,
,,,,,** End of Report **,,,,,,
";

    #[test]
    fn test_parse_legacy_export() {
        let rows = parse(LEGACY, Dialect::Legacy).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].date, date(2024, 2, 29));
        assert_eq!(rows[0].description, "INTEREST WITHHELD");
        assert_eq!(rows[0].debit, Some(Decimal::new(55, 2)));
        assert_eq!(rows[0].credit, None);
        assert_eq!(rows[0].line, 4);

        assert_eq!(rows[1].debit, None);
        assert_eq!(rows[1].credit, Some(Decimal::new(277, 2)));
        assert_eq!(rows[1].dialect, Dialect::Legacy);
    }

    #[test]
    fn test_parse_legacy_keeps_explicit_zero() {
        let csv = "Posting Date,Description,Branch,Debit Amount,Credit Amount,Running Balance
\"Feb 29, 2024\",INTEREST PAY SYS-GEN,MAIN,0.00,2.33,15233.45
";
        let rows = parse(csv, Dialect::Legacy).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].debit, Some(Decimal::new(0, 2)));
        assert_eq!(rows[0].credit, Some(Decimal::new(233, 2)));
    }

    #[test]
    fn test_parse_legacy_unquoted_date() {
        let csv = "Posting Date,Description,Branch,Debit Amount,Credit Amount,Running Balance
Feb 29, 2024,INTEREST PAY SYS-GEN,MAIN,0.00,2.33,15233.45
";
        let rows = parse(csv, Dialect::Legacy).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(2024, 2, 29));
        assert_eq!(rows[0].description, "INTEREST PAY SYS-GEN");
        assert_eq!(rows[0].credit, Some(Decimal::new(233, 2)));
    }

    #[test]
    fn test_parse_new_v1() {
        let csv = ",Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
,007318007064,INTEREST PAY SYS-GEN,\"Mar 31, 2025\",\"1,204.10\",Credit
,007318007064,INTEREST WITHHELD,\"March 31, 2025\",240.82,DEBIT
";
        let rows = parse(csv, Dialect::NewV1).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date(2025, 3, 31));
        assert_eq!(rows[0].credit, Some(Decimal::new(120410, 2)));
        assert_eq!(rows[0].debit, None);
        assert_eq!(rows[1].date, date(2025, 3, 31));
        assert_eq!(rows[1].debit, Some(Decimal::new(24082, 2)));
    }

    #[test]
    fn test_parse_new_v2() {
        let csv = ",Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
,007318007064,INTEREST WITHHELD,30-06-2025,0.62,Debit
,007318007064,INTEREST PAY SYS-GEN,30-06-2025,3.10,Credit
";
        let rows = parse(csv, Dialect::NewV2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date(2025, 6, 30));
        assert_eq!(rows[0].description, "INTEREST WITHHELD");
        assert_eq!(rows[0].debit, Some(Decimal::new(62, 2)));
        assert_eq!(rows[1].credit, Some(Decimal::new(310, 2)));
    }

    #[rstest]
    #[case::legacy_iso(Dialect::Legacy, "2024-02-29")]
    #[case::legacy_numeric(Dialect::Legacy, "02/29/2024")]
    #[case::new_v1_numeric(Dialect::NewV1, "31-03-2025")]
    #[case::new_v2_month_name(Dialect::NewV2, "Jun 30, 2025")]
    #[case::new_v2_impossible_day(Dialect::NewV2, "31-06-2025")]
    fn test_parse_date_is_strict(#[case] dialect: Dialect, #[case] raw: &str) {
        let err = parse_date(raw, dialect, 7).unwrap_err();
        match err {
            Error::DateParse {
                line,
                raw: got,
                dialect: d,
            } => {
                assert_eq!(line, 7);
                assert_eq!(got, raw);
                assert_eq!(d, dialect);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_date_in_file_names_line() {
        let csv = ",Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
,007318007064,INTEREST WITHHELD,2025-06-30,0.62,Debit
";
        let err = parse(csv, Dialect::NewV2).unwrap_err();
        assert!(matches!(err, Error::DateParse { line: 2, .. }));
    }

    #[rstest]
    #[case::plain("0.55", Some(Decimal::new(55, 2)))]
    #[case::thousands(" 55,677.05 ", Some(Decimal::new(5567705, 2)))]
    #[case::blank("", None)]
    #[case::spaces("   ", None)]
    #[case::zero("0.00", Some(Decimal::new(0, 2)))]
    fn test_parse_amount(#[case] raw: &str, #[case] expected: Option<Decimal>) {
        assert_eq!(parse_amount(raw, "Amount", 1).unwrap(), expected);
    }

    #[test]
    fn test_parse_amount_rejects_text() {
        assert!(matches!(
            parse_amount("PHP 1.00", "Debit Amount", 3),
            Err(Error::MalformedRow { line: 3, ref reason }) if reason.contains("Debit Amount")
        ));
    }

    #[test]
    fn test_unknown_indicator_is_malformed() {
        let csv = ",Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
,007318007064,INTEREST WITHHELD,30-06-2025,0.62,Reversal
";
        assert!(matches!(
            parse(csv, Dialect::NewV2),
            Err(Error::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_short_row_is_malformed() {
        let csv = "Posting Date,Description,Branch,Debit Amount,Credit Amount,Running Balance
\"Feb 29, 2024\",INTEREST PAY SYS-GEN,MAIN
";
        assert!(matches!(
            parse(csv, Dialect::Legacy),
            Err(Error::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_trailer_rows_are_skipped() {
        let csv = "Posting Date,Description,Branch,Debit Amount,Credit Amount,Running Balance
\"Feb 01, 2024\",ATM WITHDRAWAL,MAIN,500.00,,1000.00
,,,,,
,Total,,500.00,0.00,
,Ending Balance,,,,1000.00
Generated on 03/01/2024,,,,,
,,Page 1 of 2,,,
\"Feb 02, 2024\",DEPOSIT,MAIN,,250.00,1250.00
";
        let rows = parse(csv, Dialect::Legacy).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].description, "DEPOSIT");
    }

    #[test]
    fn test_marker_text_in_dated_row_is_data() {
        let csv = "Posting Date,Description,Branch,Debit Amount,Credit Amount,Running Balance
\"Feb 01, 2024\",ATM WITHDRAWAL,MAIN,500.00,,1000.00
\"Feb 02, 2024\",FEE FOR END OF REPORT PRINTING,MAIN,50.00,,950.00
\"Feb 03, 2024\",GENERATED ON REQUEST FEE,MAIN,25.00,,925.00
\"Feb 04, 2024\",DEPOSIT,MAIN,,250.00,1175.00
,** End of Report **,,,,
";
        let rows = parse(csv, Dialect::Legacy).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].description, "FEE FOR END OF REPORT PRINTING");
        assert_eq!(rows[3].description, "DEPOSIT");
    }

    #[test]
    fn test_marker_in_date_column_is_trailer() {
        let csv = "Posting Date,Description,Branch,Debit Amount,Credit Amount,Running Balance
\"Feb 01, 2024\",ATM WITHDRAWAL,MAIN,500.00,,1000.00
Generated on 03/01/2024,,,,,
Page 1 of 1,,,,,
** End of Report **,,,,,
";
        let rows = parse(csv, Dialect::Legacy).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_new_v1_rejects_day_first_row() {
        let csv = ",Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
,007318007064,INTEREST PAY SYS-GEN,\"Mar 31, 2025\",2.10,Credit
,007318007064,INTEREST WITHHELD,31-03-2025,0.42,Debit
";
        assert!(matches!(
            parse(csv, Dialect::NewV1),
            Err(Error::DateParse { line: 3, dialect: Dialect::NewV1, .. })
        ));
    }

    #[test]
    fn test_detect_content_reads_first_book_date() {
        let v1 = ",Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
,,,,,
,007318007064,INTEREST PAY SYS-GEN,\"Mar 31, 2025\",2.10,Credit
";
        assert_eq!(detect_content(v1).unwrap(), Dialect::NewV1);

        let v2 = ",Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
,007318007064,INTEREST PAY SYS-GEN,30-06-2025,3.10,Credit
";
        assert_eq!(detect_content(v2).unwrap(), Dialect::NewV2);
    }

    #[test]
    fn test_rows_after_end_of_report_are_ignored() {
        let csv = "Posting Date,Description,Branch,Debit Amount,Credit Amount,Running Balance
\"Feb 01, 2024\",ATM WITHDRAWAL,MAIN,500.00,,1000.00
,** End of Report **,,,,
garbage,that,would,not,parse,at all
";
        let rows = parse(csv, Dialect::Legacy).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_header_of_other_dialect_is_rejected() {
        assert!(matches!(
            parse(LEGACY, Dialect::NewV2),
            Err(Error::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_missing_header_is_unrecognized() {
        let csv = "Account No:,,007310159087\nfoo,bar,baz\n";
        assert!(matches!(
            parse(csv, Dialect::Legacy),
            Err(Error::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        let csv = ",Account number(BBAN),Description,Book date,Amount,Credit/debit indicator\n";
        assert!(parse(csv, Dialect::NewV2).unwrap().is_empty());
    }
}
