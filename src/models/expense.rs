//! Monthly expense model
//!
//! Recurring cost buckets keyed by (asset, project, category, year, month).
//! Writing the same key twice updates the amount rather than adding a row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ids::{AssetId, ExpenseId, ProjectId};
use super::money::Money;
use super::period::YearMonth;

/// A recurring cost for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyExpense {
    pub id: ExpenseId,

    pub asset_id: Option<AssetId>,

    pub project_id: Option<ProjectId>,

    pub year: i32,

    /// 1-12
    pub month: u32,

    /// Cost bucket (e.g., "Council Rates", "Insurance")
    pub category: String,

    pub amount: Money,

    pub currency: String,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl MonthlyExpense {
    pub fn new(period: YearMonth, category: impl Into<String>, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::default(),
            asset_id: None,
            project_id: None,
            year: period.year(),
            month: period.month(),
            category: category.into(),
            amount,
            currency: "AUD".to_string(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The month this expense belongs to, if the stored month is valid
    pub fn period(&self) -> Option<YearMonth> {
        YearMonth::new(self.year, self.month)
    }

    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if !(1..=12).contains(&self.month) {
            return Err(ExpenseValidationError::MonthOutOfRange(self.month));
        }

        if self.category.trim().is_empty() {
            return Err(ExpenseValidationError::EmptyCategory);
        }

        if self.amount.is_negative() {
            return Err(ExpenseValidationError::NegativeAmount);
        }

        Ok(())
    }
}

impl fmt::Display for MonthlyExpense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02} {} {}",
            self.year, self.month, self.category, self.amount
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseValidationError {
    MonthOutOfRange(u32),
    EmptyCategory,
    NegativeAmount,
}

impl fmt::Display for ExpenseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MonthOutOfRange(m) => write!(f, "Month must be between 1 and 12 (got {})", m),
            Self::EmptyCategory => write!(f, "Expense category cannot be empty"),
            Self::NegativeAmount => write!(f, "Expense amount cannot be negative"),
        }
    }
}

impl std::error::Error for ExpenseValidationError {}

/// What an import did to a monthly expense row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    Inserted,
    Updated,
}

impl ImportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inserted" | "insert" => Some(Self::Inserted),
            "updated" | "update" => Some(Self::Updated),
            _ => None,
        }
    }
}

impl fmt::Display for ImportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl_sql_text!(ImportAction);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Undone,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Undone => "undone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "undone" => Some(Self::Undone),
            _ => None,
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl_sql_text!(ImportStatus);

/// One CSV import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: Uuid,
    pub file_name: String,
    pub inserted_count: u32,
    pub updated_count: u32,
    pub status: ImportStatus,
    pub created_at: DateTime<Utc>,
}

/// A single row change recorded against a batch, used to undo it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub batch_id: Uuid,
    pub expense_id: ExpenseId,
    pub action: ImportAction,
    /// Amount before an update; `None` for inserts
    pub previous_amount: Option<Money>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_from_period() {
        let period = YearMonth::new(2025, 4).unwrap();
        let expense = MonthlyExpense::new(period, "Insurance", Money::from_dollars(1_200));
        assert_eq!(expense.year, 2025);
        assert_eq!(expense.month, 4);
        assert_eq!(expense.period(), Some(period));
        assert!(expense.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let period = YearMonth::new(2025, 4).unwrap();
        let mut expense = MonthlyExpense::new(period, " ", Money::from_dollars(10));
        assert_eq!(expense.validate(), Err(ExpenseValidationError::EmptyCategory));

        expense.category = "Rates".into();
        expense.month = 13;
        assert_eq!(
            expense.validate(),
            Err(ExpenseValidationError::MonthOutOfRange(13))
        );
    }
}
