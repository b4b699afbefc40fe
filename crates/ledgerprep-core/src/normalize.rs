//! Row normalization: raw statement rows to canonical transactions

use crate::error::Result;
use crate::models::{AccountType, Amount, RawRow, Transaction};

/// Counter-account for interest withheld by the bank
pub const INTEREST_EXPENSE_ACCOUNT: &str = "Expenses:Banking Costs:Interest";

/// Counter-account for interest paid to the account holder
pub const INTEREST_INCOME_ACCOUNT: &str = "Income:Interest Income";

/// Description prefixes with a known counter-account, checked in order
const TRANSFER_RULES: &[(&str, &str)] = &[
    ("INTEREST WITHHELD", INTEREST_EXPENSE_ACCOUNT),
    ("INTEREST PAY", INTEREST_INCOME_ACCOUNT),
];

/// Collapse runs of whitespace to a single space and trim the ends
pub fn clean_description(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Counter-account for a cleaned description, if it is a recognized posting
pub fn transfer_account_for(description: &str) -> Option<&'static str> {
    let upper = description.to_uppercase();
    TRANSFER_RULES
        .iter()
        .find(|(prefix, _)| upper.starts_with(prefix))
        .map(|(_, account)| *account)
}

/// Turn one parsed row into a transaction for the given account
pub fn normalize(row: RawRow, account: AccountType) -> Result<Transaction> {
    let amount = Amount::from_sides(row.debit, row.credit, row.line)?;

    let description = clean_description(&row.description);
    let transfer_account = transfer_account_for(&description).map(String::from);

    Ok(Transaction {
        date: row.date,
        description,
        amount,
        account,
        transfer_account,
    })
}

/// Normalize every row of a statement, stopping at the first invalid one
pub fn normalize_all(rows: Vec<RawRow>, account: AccountType) -> Result<Vec<Transaction>> {
    rows.into_iter()
        .map(|row| normalize(row, account))
        .collect()
}
