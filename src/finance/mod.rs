//! Financing calculations
//!
//! Pure functions over loan parameters. Nothing here touches storage.

pub mod construction;
pub mod dual_phase;
pub mod loan;

pub use construction::{ConstructionLoan, ConstructionSummary, DrawProfile, DrawRow};
pub use dual_phase::{ComparisonRow, DualPhaseLoan, RefinanceAnalysis};
pub use loan::{InvestmentLoan, LoanPhase, LoanSummary, LoanValidationError, ScheduleRow};
