//! Transaction model
//!
//! A ledger entry against an asset and/or project. Amounts are always stored
//! positive; whether the entry adds to or subtracts from the cash balance is
//! decided by its kind.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AssetId, ProjectId, TransactionId};
use super::money::Money;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" | "inflow" => Some(Self::Income),
            "expense" | "out" | "outflow" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Signed effect of an amount of this kind on the cash balance
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        })
    }
}

impl_sql_text!(TransactionKind);

/// A financial ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    pub date: NaiveDate,

    pub kind: TransactionKind,

    /// Always positive
    pub amount: Money,

    pub category: Option<String>,

    pub description: Option<String>,

    /// Invoice or reference number
    pub reference: Option<String>,

    /// Vendor or payer
    pub payee: Option<String>,

    pub asset_id: Option<AssetId>,

    pub project_id: Option<ProjectId>,

    pub is_reconciled: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new, unsaved transaction
    pub fn new(date: NaiveDate, kind: TransactionKind, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::default(),
            date,
            kind,
            amount,
            category: None,
            description: None,
            reference: None,
            payee: None,
            asset_id: None,
            project_id: None,
            is_reconciled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount with the sign implied by the kind
    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount);
        }

        if let Some(category) = &self.category {
            if category.len() > 100 {
                return Err(TransactionValidationError::CategoryTooLong(category.len()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date, self.kind, self.amount)?;
        if let Some(category) = &self.category {
            write!(f, " ({})", category)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount,
    CategoryTooLong(usize),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(
                f,
                "Transaction amount must be greater than zero; use the kind to record an expense"
            ),
            Self::CategoryTooLong(len) => {
                write!(f, "Category too long ({} chars, max 100)", len)
            }
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_signed_amount() {
        let rent = Transaction::new(date(), TransactionKind::Income, Money::from_dollars(45_000));
        assert_eq!(rent.signed_amount().cents(), 4_500_000);

        let rates = Transaction::new(date(), TransactionKind::Expense, Money::from_dollars(3_000));
        assert_eq!(rates.signed_amount().cents(), -300_000);
    }

    #[test]
    fn test_validation_rejects_non_positive() {
        let txn = Transaction::new(date(), TransactionKind::Expense, Money::zero());
        assert_eq!(
            txn.validate(),
            Err(TransactionValidationError::NonPositiveAmount)
        );

        let txn = Transaction::new(date(), TransactionKind::Expense, Money::from_cents(-5));
        assert!(txn.validate().is_err());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(TransactionKind::parse("Income"), Some(TransactionKind::Income));
        assert_eq!(TransactionKind::parse("OUT"), Some(TransactionKind::Expense));
        assert_eq!(TransactionKind::parse("transfer"), None);
    }
}
