//! Core data models for estate
//!
//! This module contains the data structures of the portfolio domain: assets,
//! projects, ledger transactions, consultants and their quotes, monthly
//! expenses, WBS tasks and market indicators.

/// Store an enum as TEXT using its `as_str()` / `parse()` pair
macro_rules! impl_sql_text {
    ($ty:ty) => {
        impl rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $ty {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                let text = value.as_str()?;
                <$ty>::parse(text).ok_or_else(|| {
                    rusqlite::types::FromSqlError::Other(
                        format!("unknown {} value '{}'", stringify!($ty), text).into(),
                    )
                })
            }
        }
    };
}

pub mod asset;
pub mod consultant;
pub mod expense;
pub mod ids;
pub mod market;
pub mod money;
pub mod period;
pub mod project;
pub mod quote;
pub mod task;
pub mod transaction;

pub use asset::{Asset, AssetStatus, AssetType};
pub use consultant::Consultant;
pub use expense::{ImportAction, ImportBatch, ImportRecord, ImportStatus, MonthlyExpense};
pub use ids::{
    AssetId, ConsultantId, ExpenseId, IndicatorId, ProjectId, QuoteId, TaskId, TransactionId,
};
pub use market::MarketIndicator;
pub use money::Money;
pub use period::YearMonth;
pub use project::{Project, ProjectStatus};
pub use quote::{Quote, QuoteStatus};
pub use task::{DependencyType, ProjectTask, TaskStatus};
pub use transaction::{Transaction, TransactionKind};
