//! Quote model
//!
//! A consultant's price for a scope of work.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AssetId, ConsultantId, ProjectId, QuoteId};
use super::money::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "submitted" => Some(Self::Pending),
            "accepted" | "approved" => Some(Self::Accepted),
            "rejected" | "declined" => Some(Self::Rejected),
            "completed" | "complete" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Accepted and completed quotes count as committed cost
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Accepted | Self::Completed)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Completed => "Completed",
        })
    }
}

impl_sql_text!(QuoteStatus);

/// A consultant's price quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,

    pub consultant_id: ConsultantId,

    pub asset_id: Option<AssetId>,

    pub project_id: Option<ProjectId>,

    pub quote_date: NaiveDate,

    /// Quote expires after this date; `None` means it does not expire
    pub valid_until: Option<NaiveDate>,

    pub amount: Money,

    /// ISO currency code
    pub currency: String,

    pub status: QuoteStatus,

    pub scope: Option<String>,

    pub project_type: Option<String>,

    /// Size driver for price estimation (usually square metres)
    pub project_size: Option<f64>,

    /// Final invoiced amount once the work is done
    pub actual_amount: Option<Money>,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(consultant_id: ConsultantId, quote_date: NaiveDate, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: QuoteId::default(),
            consultant_id,
            asset_id: None,
            project_id: None,
            quote_date,
            valid_until: None,
            amount,
            currency: "AUD".to_string(),
            status: QuoteStatus::default(),
            scope: None,
            project_type: None,
            project_size: None,
            actual_amount: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// A quote is valid while `valid_until` is absent or not yet past
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.valid_until.map_or(true, |until| date <= until)
    }

    pub fn validate(&self) -> Result<(), QuoteValidationError> {
        if !self.amount.is_positive() {
            return Err(QuoteValidationError::NonPositiveAmount);
        }

        if let Some(until) = self.valid_until {
            if until < self.quote_date {
                return Err(QuoteValidationError::ExpiresBeforeIssue);
            }
        }

        if let Some(size) = self.project_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(QuoteValidationError::InvalidProjectSize);
            }
        }

        if self.currency.trim().len() != 3 {
            return Err(QuoteValidationError::InvalidCurrency(self.currency.clone()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteValidationError {
    NonPositiveAmount,
    ExpiresBeforeIssue,
    InvalidProjectSize,
    InvalidCurrency(String),
}

impl fmt::Display for QuoteValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Quote amount must be greater than zero"),
            Self::ExpiresBeforeIssue => write!(f, "Valid-until date is before the quote date"),
            Self::InvalidProjectSize => write!(f, "Project size must be greater than zero"),
            Self::InvalidCurrency(code) => write!(f, "Invalid currency code: {}", code),
        }
    }
}

impl std::error::Error for QuoteValidationError {}
