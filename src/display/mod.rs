//! Display formatting for terminal output
//!
//! List views render through `tabled`; detail views are plain aligned text.

pub mod asset;
pub mod consultant;
pub mod expense;
pub mod finance;
pub mod market;
pub mod project;
pub mod task;
pub mod transaction;

pub use asset::{format_asset_details, format_asset_list, format_portfolio_summary};
pub use consultant::{
    format_consultant_details, format_consultant_list, format_price_estimate, format_quote_history,
    format_recommendations,
};
pub use expense::{format_batch_list, format_expense_list, format_totals};
pub use finance::{
    format_cashflow, format_construction_summary, format_draw_schedule, format_loan_schedule,
    format_loan_summary, format_refinance,
};
pub use market::{format_indicator_list, format_snapshots};
pub use project::{format_cost_rollup, format_project_details, format_project_list};
pub use task::{format_schedule_summary, format_task_list, format_task_tree};
pub use transaction::{format_transaction_details, format_transaction_list};

use std::fmt::Write;
use std::sync::OnceLock;

use chrono::NaiveDate;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::warn;

use crate::config::settings::Settings;
use crate::models::Money;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_FORMAT: OnceLock<String> = OnceLock::new();

/// Apply the configured currency symbol and date format to terminal output.
///
/// Exports are unaffected and keep ISO dates and plain numbers.
pub fn apply_settings(settings: &Settings) {
    Money::set_display_symbol(&settings.currency_symbol);

    let format = if is_valid_date_format(&settings.date_format) {
        settings.date_format.clone()
    } else {
        warn!(format = %settings.date_format, "Unusable date format, showing ISO dates");
        ISO_DATE_FORMAT.to_string()
    };
    let _ = DATE_FORMAT.set(format);
}

/// Whether `format` renders a calendar date without error
pub fn is_valid_date_format(format: &str) -> bool {
    !format.trim().is_empty()
        && NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| try_format_date(d, format))
            .is_some()
}

fn try_format_date(date: NaiveDate, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format)).ok()?;
    Some(out)
}

pub(crate) fn format_date_with(date: NaiveDate, format: &str) -> String {
    try_format_date(date, format).unwrap_or_else(|| date.format(ISO_DATE_FORMAT).to_string())
}

/// A date in the configured display format
pub(crate) fn fmt_date(date: NaiveDate) -> String {
    format_date_with(date, DATE_FORMAT.get().map_or(ISO_DATE_FORMAT, String::as_str))
}

pub(crate) fn opt_date(date: Option<NaiveDate>) -> String {
    date.map(fmt_date).unwrap_or_else(|| "-".to_string())
}

/// Render rows as a table, or `empty` when there are none
pub(crate) fn render<T: Tabled>(rows: Vec<T>, empty: &str) -> String {
    if rows.is_empty() {
        return empty.to_string();
    }
    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n", table)
}

pub(crate) fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub(crate) fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}
