//! Import-file CSV output
//!
//! The output layout is fixed:
//! `Date,Description,Debit,Credit,Account,Transfer Account`, with dates as
//! `M/D/YYYY` and an empty cell for the absent side of each amount.

use std::io::Write;

use chrono::{Datelike, NaiveDate};
use csv::{Terminator, WriterBuilder};
use tracing::debug;

use crate::error::Result;
use crate::models::Transaction;

/// Header row of the import file
pub const IMPORT_HEADER: [&str; 6] = [
    "Date",
    "Description",
    "Debit",
    "Credit",
    "Account",
    "Transfer Account",
];

/// Format a date as `M/D/YYYY` without leading zeros
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Write transactions as import CSV to any writer
pub fn write_transactions<W: Write>(writer: W, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(IMPORT_HEADER)?;
    for tx in transactions {
        let debit = tx.debit().map(|d| d.to_string()).unwrap_or_default();
        let credit = tx.credit().map(|c| c.to_string()).unwrap_or_default();
        wtr.write_record([
            format_date(tx.date).as_str(),
            tx.description.as_str(),
            debit.as_str(),
            credit.as_str(),
            tx.account_name(),
            tx.transfer_account.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;

    debug!("Wrote {} transactions", transactions.len());
    Ok(())
}

/// Render transactions as an import CSV string
pub fn to_csv_string(transactions: &[Transaction]) -> Result<String> {
    let mut buf = Vec::new();
    write_transactions(&mut buf, transactions)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountType, Amount};
    use crate::normalize::INTEREST_INCOME_ACCOUNT;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_date_drops_leading_zeros() {
        assert_eq!(format_date(date(2024, 2, 9)), "2/9/2024");
        assert_eq!(format_date(date(2025, 12, 31)), "12/31/2025");
    }

    #[test]
    fn test_empty_export_is_header_only() {
        assert_eq!(
            to_csv_string(&[]).unwrap(),
            "Date,Description,Debit,Credit,Account,Transfer Account\n"
        );
    }

    #[test]
    fn test_export_rows() {
        let transactions = vec![
            Transaction {
                date: date(2024, 2, 29),
                description: "INTEREST PAY SYS-GEN".to_string(),
                amount: Amount::Credit(Decimal::new(233, 2)),
                account: AccountType::Checking,
                transfer_account: Some(INTEREST_INCOME_ACCOUNT.to_string()),
            },
            Transaction {
                date: date(2024, 3, 1),
                description: "BILLS PAYMENT, MERALCO".to_string(),
                amount: Amount::Debit(Decimal::new(150000, 2)),
                account: AccountType::Savings,
                transfer_account: None,
            },
        ];

        let csv = to_csv_string(&transactions).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2/29/2024,INTEREST PAY SYS-GEN,,2.33,Assets:Current Assets:Banks Local:BDO Current,Income:Interest Income"
        );
        assert_eq!(
            lines[2],
            "3/1/2024,\"BILLS PAYMENT, MERALCO\",1500.00,,Assets:Current Assets:Banks Local:BDO Savings,"
        );
        assert!(!csv.contains('\r'));
    }
}
