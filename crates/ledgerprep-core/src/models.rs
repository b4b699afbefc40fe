//! Domain models for ledgerprep

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Ledger account for the BDO checking (current) account
pub const CHECKING_LEDGER_ACCOUNT: &str = "Assets:Current Assets:Banks Local:BDO Current";

/// Ledger account for the BDO savings account
pub const SAVINGS_LEDGER_ACCOUNT: &str = "Assets:Current Assets:Banks Local:BDO Savings";

/// BDO account types that statements are exported for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AccountType {
    Checking,
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "Checking",
            Self::Savings => "Savings",
        }
    }

    /// Canonical ledger account string this account posts to
    pub fn ledger_account(&self) -> &'static str {
        match self {
            Self::Checking => CHECKING_LEDGER_ACCOUNT,
            Self::Savings => SAVINGS_LEDGER_ACCOUNT,
        }
    }

    pub fn all() -> &'static [AccountType] {
        &[Self::Checking, Self::Savings]
    }
}

impl std::str::FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "checking" | "current" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            _ => Err(Error::UnknownAccountType(s.to_string())),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CSV layouts the bank has used for statement exports over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Pre-2025-03 export: separate debit/credit columns, "Feb 29, 2024" dates
    Legacy,
    /// First new-style export: amount + credit/debit indicator, "Mar 31, 2025" dates
    NewV1,
    /// Current export: amount + credit/debit indicator, "30-06-2025" dates
    NewV2,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::NewV1 => "new_v1",
            Self::NewV2 => "new_v2",
        }
    }

    pub fn all() -> &'static [Dialect] {
        &[Self::Legacy, Self::NewV1, Self::NewV2]
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A calendar month used to group statements into one output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::InvalidPeriod(format!("{}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// The period a date falls in
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Human-friendly name, e.g. "February 2024"
    pub fn display_name(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl std::str::FromStr for Period {
    type Err = Error;

    /// Parse a `YYYY-MM` period
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPeriod(format!("{} (expected YYYY-MM)", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The money side of a transaction: exactly one of debit or credit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    /// Money leaving the account
    Debit(Decimal),
    /// Money entering the account
    Credit(Decimal),
}

impl Amount {
    /// Build an amount from the two statement columns of the row at `line`.
    ///
    /// A zero side counts as absent. Exactly one side must remain and it must
    /// be positive, otherwise this is [`Error::InvalidAmount`].
    pub fn from_sides(debit: Option<Decimal>, credit: Option<Decimal>, line: u64) -> Result<Self> {
        let debit = debit.filter(|d| !d.is_zero());
        let credit = credit.filter(|c| !c.is_zero());

        let reason = match (debit, credit) {
            (Some(d), None) if !d.is_sign_negative() => return Ok(Self::Debit(d)),
            (None, Some(c)) if !c.is_sign_negative() => return Ok(Self::Credit(c)),
            (Some(d), Some(c)) => format!("both debit ({}) and credit ({}) are set", d, c),
            (None, None) => "neither debit nor credit is set".to_string(),
            (Some(d), None) => format!("negative debit {}", d),
            (None, Some(c)) => format!("negative credit {}", c),
        };
        Err(Error::InvalidAmount { line, reason })
    }

    pub fn debit(&self) -> Option<Decimal> {
        match self {
            Self::Debit(d) => Some(*d),
            Self::Credit(_) => None,
        }
    }

    pub fn credit(&self) -> Option<Decimal> {
        match self {
            Self::Debit(_) => None,
            Self::Credit(c) => Some(*c),
        }
    }
}

/// A statement row after dialect parsing, before normalization
///
/// Debit/credit hold whatever the statement said, including explicit zeros;
/// validation happens in [`crate::normalize::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source file
    pub line: u64,
    pub dialect: Dialect,
    pub date: NaiveDate,
    pub description: String,
    pub debit: Option<Decimal>,
    pub credit: Option<Decimal>,
}

/// A canonical transaction ready for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Amount,
    pub account: AccountType,
    /// Counter-account, filled in only for recognized interest postings
    pub transfer_account: Option<String>,
}

impl Transaction {
    pub fn debit(&self) -> Option<Decimal> {
        self.amount.debit()
    }

    pub fn credit(&self) -> Option<Decimal> {
        self.amount.credit()
    }

    pub fn account_name(&self) -> &'static str {
        self.account.ledger_account()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_account_type_from_str() {
        assert_eq!(AccountType::from_str("Checking").unwrap(), AccountType::Checking);
        assert_eq!(AccountType::from_str("savings").unwrap(), AccountType::Savings);
        assert_eq!(AccountType::from_str(" CURRENT ").unwrap(), AccountType::Checking);
        assert!(matches!(
            AccountType::from_str("Credit"),
            Err(Error::UnknownAccountType(ref s)) if s == "Credit"
        ));
    }

    #[test]
    fn test_every_account_type_has_a_ledger_account() {
        for account in AccountType::all() {
            assert!(account.ledger_account().starts_with("Assets:"));
        }
    }

    #[test]
    fn test_period_parse_and_display() {
        let period = Period::from_str("2024-02").unwrap();
        assert_eq!(period.year(), 2024);
        assert_eq!(period.month(), 2);
        assert_eq!(period.to_string(), "2024-02");
        assert_eq!(period.display_name(), "February 2024");

        assert!(Period::from_str("2024-13").is_err());
        assert!(Period::from_str("2024-2").is_err());
        assert!(Period::from_str("February").is_err());
    }

    #[test]
    fn test_period_last_day() {
        let leap = Period::new(2024, 2).unwrap();
        assert_eq!(leap.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let december = Period::new(2024, 12).unwrap();
        assert_eq!(december.last_day(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());

        let june = Period::new(2025, 6).unwrap();
        assert_eq!(june.last_day(), NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    }

    #[test]
    fn test_period_ordering_and_contains() {
        let jan = Period::new(2025, 1).unwrap();
        let dec = Period::new(2024, 12).unwrap();
        assert!(dec < jan);
        assert!(jan.contains(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()));
        assert!(!jan.contains(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert_eq!(Period::of(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()), jan);
    }

    #[test]
    fn test_amount_from_sides() {
        let two = Decimal::new(233, 2);
        let zero = Decimal::new(0, 2);

        assert_eq!(
            Amount::from_sides(Some(zero), Some(two), 4).unwrap(),
            Amount::Credit(two)
        );
        assert_eq!(Amount::from_sides(Some(two), None, 4).unwrap(), Amount::Debit(two));

        for (debit, credit) in [
            (Some(two), Some(two)),
            (None, None),
            (Some(zero), Some(zero)),
            (Some(-two), None),
            (None, Some(-two)),
        ] {
            assert!(matches!(
                Amount::from_sides(debit, credit, 9),
                Err(Error::InvalidAmount { line: 9, .. })
            ));
        }
    }

    #[test]
    fn test_amount_accessors_are_exclusive() {
        let amount = Amount::Debit(Decimal::new(62, 2));
        assert_eq!(amount.debit(), Some(Decimal::new(62, 2)));
        assert_eq!(amount.credit(), None);
    }
}
