//! Service layer for estate
//!
//! Services sit between the CLI and the repositories. They validate input,
//! enforce cross-table rules, write the audit log and compute aggregates.

pub mod asset;
pub mod consultant;
pub mod expense;
pub mod project;
pub mod quote;
pub mod task;
pub mod transaction;

pub use asset::{AssetService, FilterOptions, PortfolioSummary};
pub use consultant::{ConsultantService, PriceEstimate, Recommendation, ScopeMatch};
pub use expense::{ExpenseService, ImportTarget};
pub use project::{BudgetReport, CostRollup, ProjectService};
pub use quote::QuoteService;
pub use task::{ScheduleSummary, TaskNode, TaskService};
pub use transaction::{CashflowPoint, TransactionService};
