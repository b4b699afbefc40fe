//! Combining per-file transactions into one ordered sequence

use serde::Serialize;
use tracing::warn;

use crate::models::{AccountType, Period, Transaction};

/// Transactions imported from one statement file
#[derive(Debug, Clone)]
pub struct StatementInput {
    pub account: AccountType,
    pub transactions: Vec<Transaction>,
}

/// Non-fatal conditions found while merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No statement was available for an expected account in this period
    MissingAccountData { account: AccountType, period: Period },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAccountData { account, period } => write!(
                f,
                "no {} statement for {}",
                account,
                period.display_name()
            ),
        }
    }
}

/// Result of a merge: the ordered transactions plus any warnings
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<Warning>,
}

/// Merge statement inputs for one period.
///
/// Inputs are concatenated in the order given and stably sorted by date, so
/// same-day transactions keep file order, then row order. Each expected
/// account with no input yields a [`Warning::MissingAccountData`].
pub fn merge(
    inputs: Vec<StatementInput>,
    expected_accounts: &[AccountType],
    period: Period,
) -> MergeOutcome {
    let mut warnings = Vec::new();
    for account in expected_accounts {
        if !inputs.iter().any(|input| input.account == *account) {
            warn!("Missing {} data for {}", account, period);
            warnings.push(Warning::MissingAccountData {
                account: *account,
                period,
            });
        }
    }

    let mut transactions: Vec<Transaction> = inputs
        .into_iter()
        .flat_map(|input| input.transactions)
        .collect();
    // sort_by_key is stable
    transactions.sort_by_key(|tx| tx.date);

    MergeOutcome {
        transactions,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Amount;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn tx(day: u32, description: &str, account: AccountType) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            description: description.to_string(),
            amount: Amount::Debit(Decimal::ONE),
            account,
            transfer_account: None,
        }
    }

    fn feb() -> Period {
        Period::new(2024, 2).unwrap()
    }

    #[test]
    fn test_merge_sorts_by_date() {
        let inputs = vec![
            StatementInput {
                account: AccountType::Checking,
                transactions: vec![tx(20, "C20", AccountType::Checking), tx(3, "C3", AccountType::Checking)],
            },
            StatementInput {
                account: AccountType::Savings,
                transactions: vec![tx(10, "S10", AccountType::Savings)],
            },
        ];

        let outcome = merge(inputs, AccountType::all(), feb());
        let order: Vec<&str> = outcome.transactions.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(order, vec!["C3", "S10", "C20"]);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_merge_same_date_keeps_input_order() {
        let inputs = vec![
            StatementInput {
                account: AccountType::Savings,
                transactions: vec![tx(29, "S-first", AccountType::Savings), tx(29, "S-second", AccountType::Savings)],
            },
            StatementInput {
                account: AccountType::Checking,
                transactions: vec![tx(29, "C-first", AccountType::Checking)],
            },
        ];

        let outcome = merge(inputs, AccountType::all(), feb());
        let order: Vec<&str> = outcome.transactions.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(order, vec!["S-first", "S-second", "C-first"]);
    }

    #[test]
    fn test_merge_warns_for_missing_account() {
        let inputs = vec![StatementInput {
            account: AccountType::Checking,
            transactions: vec![tx(1, "C1", AccountType::Checking)],
        }];

        let outcome = merge(inputs, AccountType::all(), feb());
        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(
            outcome.warnings,
            vec![Warning::MissingAccountData {
                account: AccountType::Savings,
                period: feb(),
            }]
        );
        assert_eq!(outcome.warnings[0].to_string(), "no Savings statement for February 2024");
    }

    #[test]
    fn test_empty_input_still_counts_as_present() {
        let inputs = vec![
            StatementInput {
                account: AccountType::Checking,
                transactions: vec![],
            },
            StatementInput {
                account: AccountType::Savings,
                transactions: vec![],
            },
        ];

        let outcome = merge(inputs, AccountType::all(), feb());
        assert!(outcome.transactions.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_warning_serializes_with_kind() {
        let warning = Warning::MissingAccountData {
            account: AccountType::Savings,
            period: feb(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "missing_account_data");
        assert_eq!(json["account"], "Savings");
        assert_eq!(json["period"], "2024-02");
    }
}
