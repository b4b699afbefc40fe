//! Test utilities for ledgerprep-core
//!
//! Fixture statements in each dialect, shaped like real bank exports, and a
//! helper to drop them into a directory under the bank's file naming.

use std::path::{Path, PathBuf};

/// Legacy checking export with preamble, spacer columns and trailer rows.
/// Four transactions in February 2024.
pub const LEGACY_CHECKING: &str = "\
Account No:,,007310159087,,,,,,,,,
Account Name:,,JUAN DELA CRUZ,,,,,,,,,
Period Covered:,,02/01/2024 - 02/29/2024,,,,,,,,,
,,,,,,,,,,,
Posting Date,Description,,Branch,Debit Amount,,Credit Amount,,Running Balance,,Currency,Check Number
\"Feb 05, 2024\",ATM WITHDRAWAL,, MAKATI,\"5,000.00\",,,,\"50,677.60\",,PHP,
\"Feb 15, 2024\",FUND TRANSFER,, ,,,\"5,000.00\",,\"55,677.60\",,PHP,
\"Feb 29, 2024\",INTEREST WITHHELD,, ,0.55,,,,\"55,677.05\",,PHP,
\"Feb 29, 2024\",INTEREST PAY SYS-GEN,, ,,,2.77,,\"55,679.82\",,PHP,
,,,,,,,,,,Page 1 of 1,
,,,,,** End of Report **,,,,,,
";

/// Legacy savings export with explicit zero amounts. Two transactions on
/// February 29, 2024.
pub const LEGACY_SAVINGS: &str = "\
Posting Date,Description,Branch,Debit Amount,Credit Amount,Running Balance
\"Feb 29, 2024\",INTEREST PAY SYS-GEN,MAIN,0.00,2.33,15233.45
\"Feb 29, 2024\",INTEREST WITHHELD,MAIN,0.47,0.00,15232.98
";

/// First new-style checking export, with month-name book dates. Two
/// transactions in March 2025.
pub const NEW_V1_CHECKING: &str = "\
,Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
,007310159087,POS PURCHASE SM SUPERMARKET,\"Mar 03, 2025\",\"1,250.75\",Debit
,007310159087,INTEREST PAY SYS-GEN,\"Mar 31, 2025\",2.10,Credit
";

/// Current savings export. Two transactions on June 30, 2025.
pub const NEW_V2_SAVINGS: &str = "\
,Account number(BBAN),Description,Book date,Amount,Credit/debit indicator
,007318007064,INTEREST WITHHELD,30-06-2025,0.62,Debit
,007318007064,INTEREST PAY SYS-GEN,30-06-2025,3.10,Credit
";

/// Bank file name for a statement, e.g.
/// `My_Transactions BDO Checking 007310159087 2024-02-29.csv`
pub fn statement_file_name(account: &str, date: &str) -> String {
    let number = match account {
        "Savings" => "007318007064",
        _ => "007310159087",
    };
    format!("My_Transactions BDO {} {} {}.csv", account, number, date)
}

/// Write a statement into `dir` under the bank's naming and return its path
pub fn write_statement(dir: &Path, account: &str, date: &str, content: &str) -> PathBuf {
    let path = dir.join(statement_file_name(account, date));
    std::fs::write(&path, content).expect("write fixture statement");
    path
}
