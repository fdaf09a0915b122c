//! Reports module for estate
//!
//! Text and CSV reports built on top of the service aggregates: the finance
//! overview, the asset portfolio and the project budget rollup.

pub mod finance_overview;
pub mod portfolio;
pub mod project_budget;

pub use finance_overview::FinanceOverviewReport;
pub use portfolio::PortfolioReport;
pub use project_budget::ProjectBudgetReport;
