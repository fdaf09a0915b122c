//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod asset;
pub mod audit;
pub mod backup;
pub mod consultant;
pub mod expense;
pub mod export;
pub mod finance;
pub mod market;
pub mod project;
pub mod quote;
pub mod report;
pub mod task;
pub mod transaction;

pub use asset::{handle_asset_command, AssetCommands};
pub use audit::{handle_audit_command, AuditArgs};
pub use backup::{handle_backup_command, BackupCommands};
pub use consultant::{handle_consultant_command, ConsultantCommands};
pub use expense::{handle_expense_command, ExpenseCommands};
pub use export::{handle_export_command, ExportCommands};
pub use finance::{
    handle_finance_command, handle_loan_command, ConstructionArgs, DualArgs, FinanceCommands,
    LoanArgs, LoanCommands,
};
pub use market::{handle_market_command, MarketCommands};
pub use project::{handle_project_command, ProjectCommands};
pub use quote::{handle_quote_command, QuoteCommands};
pub use report::{handle_report_command, ReportCommands};
pub use task::{handle_task_command, TaskCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use chrono::{Local, NaiveDate};

use crate::error::{EstateError, EstateResult};
use crate::models::{Money, YearMonth};

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn parse_money(value: &str, field: &str) -> EstateResult<Money> {
    Money::parse(value).map_err(|e| {
        EstateError::Validation(format!(
            "Invalid {}: '{}'. Use a format like '1500.00' or '1500'. Error: {}",
            field, value, e
        ))
    })
}

pub(crate) fn parse_opt_money(value: Option<&str>, field: &str) -> EstateResult<Option<Money>> {
    value.map(|v| parse_money(v, field)).transpose()
}

pub(crate) fn parse_date(value: &str) -> EstateResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        EstateError::Validation(format!("Invalid date: '{}'. Use YYYY-MM-DD", value))
    })
}

pub(crate) fn parse_opt_date(value: Option<&str>) -> EstateResult<Option<NaiveDate>> {
    value.map(parse_date).transpose()
}

pub(crate) fn parse_month(value: &str) -> EstateResult<YearMonth> {
    value
        .parse()
        .map_err(|e: String| EstateError::Validation(format!("Invalid month '{}': {}", value, e)))
}

/// Parse an enum option with its own `parse`, listing the valid values on failure
pub(crate) fn parse_choice<T>(
    value: &str,
    what: &str,
    valid: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> EstateResult<T> {
    parse(value).ok_or_else(|| {
        EstateError::Validation(format!("Invalid {}: '{}'. Valid values: {}", what, value, valid))
    })
}

/// Comma-separated list with blanks dropped
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
