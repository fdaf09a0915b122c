//! Construction-to-investment refinance
//!
//! Funds the build with a [`ConstructionLoan`], then refinances the completed
//! asset into an [`InvestmentLoan`] sized on its completion value. The analysis
//! shows whether the new loan clears the construction payoff and how much
//! equity the project ties up once it has.

use serde::Serialize;

use super::construction::{ConstructionLoan, ConstructionSummary};
use super::loan::{InvestmentLoan, LoanSummary, LoanValidationError};
use crate::models::Money;

/// Lowest debt-service coverage a lender would normally accept
pub const MIN_ADEQUATE_DSCR: f64 = 1.25;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualPhaseLoan {
    pub construction: ConstructionLoan,
    /// `property_value` is the completion value
    pub investment: InvestmentLoan,
    pub annual_noi: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinanceAnalysis {
    pub construction: ConstructionSummary,
    pub investment: LoanSummary,

    pub development_margin: Money,
    pub development_margin_percent: f64,

    pub construction_payoff: Money,
    pub investment_loan: Money,
    /// Investment loan less construction payoff; negative is a shortfall
    pub cash_difference: Money,
    pub refinance_feasible: bool,
    pub equity_release: Money,
    pub additional_equity_required: Money,

    pub initial_equity: Money,
    /// Construction interest paid from equity when it is not capitalised
    pub interest_equity: Money,
    pub total_equity: Money,
    pub equity_percent_of_cost: f64,
    pub net_equity_invested: Money,

    pub dscr: Option<f64>,
    /// Construction fees plus the investment establishment fee
    pub upfront_costs: Money,
}

impl RefinanceAnalysis {
    pub fn dscr_adequate(&self) -> bool {
        self.dscr.map_or(false, |d| d >= MIN_ADEQUATE_DSCR)
    }
}

/// One line of the side-by-side comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub category: &'static str,
    pub parameter: &'static str,
    pub value: String,
}

impl DualPhaseLoan {
    /// Default construction and investment terms for a project costing
    /// `development_cost` and worth `completion_value` when finished
    pub fn new(development_cost: Money, completion_value: Money) -> Self {
        Self {
            construction: ConstructionLoan::new(development_cost),
            investment: InvestmentLoan::new(completion_value),
            annual_noi: None,
        }
    }

    pub fn validate(&self) -> Result<(), LoanValidationError> {
        self.construction.validate()?;
        self.investment.validate()
    }

    pub fn analyse(&self) -> RefinanceAnalysis {
        let construction = self.construction.summary();
        let investment = self.investment.summary();
        let cost = self.construction.development_cost;
        let value = self.investment.property_value;

        let payoff = construction.loan_at_completion;
        let new_loan = investment.loan_amount;
        let cash_difference = new_loan - payoff;
        let zero = Money::zero();

        let initial_equity = construction.equity_required;
        let interest_equity = if self.construction.capitalise_interest {
            zero
        } else {
            construction.total_interest
        };
        let total_equity = initial_equity + interest_equity;
        let equity_release = cash_difference.max(zero);

        let margin = value - cost;
        let percent_of_cost = |amount: Money| {
            if cost.is_positive() {
                amount.as_f64() / cost.as_f64() * 100.0
            } else {
                0.0
            }
        };

        let dscr = self
            .annual_noi
            .filter(|noi| noi.is_positive())
            .map(|noi| self.investment.dscr(noi));

        RefinanceAnalysis {
            development_margin: margin,
            development_margin_percent: percent_of_cost(margin),
            construction_payoff: payoff,
            investment_loan: new_loan,
            cash_difference,
            refinance_feasible: new_loan >= payoff,
            equity_release,
            additional_equity_required: (-cash_difference).max(zero),
            initial_equity,
            interest_equity,
            total_equity,
            equity_percent_of_cost: percent_of_cost(total_equity),
            net_equity_invested: total_equity - equity_release,
            dscr,
            upfront_costs: construction.total_fees + investment.establishment_fee,
            construction,
            investment,
        }
    }

    /// Key figures of both phases and the refinance, in display order
    pub fn comparison(&self) -> Vec<ComparisonRow> {
        let a = self.analyse();
        let c = &self.construction;
        let i = &self.investment;
        let row = |category, parameter, value: String| ComparisonRow {
            category,
            parameter,
            value,
        };
        const BUILD: &str = "Construction Loan";
        const HOLD: &str = "Investment Loan";
        const REFI: &str = "Refinance";
        const EQUITY: &str = "Equity";

        let mut rows = vec![
            row(BUILD, "Loan Amount", a.construction.loan_amount.to_string()),
            row(BUILD, "Loan to Cost", format!("{:.1}%", c.ltc_percent)),
            row(BUILD, "Interest Rate", format!("{:.2}% p.a.", c.rate_percent)),
            row(BUILD, "Duration", format!("{} months", c.duration_months)),
            row(BUILD, "Draw Profile", c.profile.to_string()),
            row(BUILD, "Total Interest", a.construction.total_interest.to_string()),
            row(BUILD, "Total Fees", a.construction.total_fees.to_string()),
            row(BUILD, "Loan at Completion", a.construction.loan_at_completion.to_string()),
            row(HOLD, "Loan Amount", a.investment.loan_amount.to_string()),
            row(HOLD, "LVR", format!("{:.1}%", i.lvr_percent)),
            row(HOLD, "Interest Rate", format!("{:.2}% p.a.", i.rate_percent)),
            row(HOLD, "Loan Term", format!("{} years", i.term_years)),
            row(HOLD, "IO Period", format!("{} years", i.io_years)),
            row(HOLD, "Monthly IO Payment", a.investment.io_payment.to_string()),
            row(HOLD, "Monthly P&I Payment", a.investment.pi_payment.to_string()),
            row(REFI, "Cash Out / Shortfall", a.cash_difference.to_string()),
            row(
                REFI,
                "Refinance Feasible",
                if a.refinance_feasible { "Yes" } else { "No" }.to_string(),
            ),
            row(EQUITY, "Total Equity Required", a.total_equity.to_string()),
            row(EQUITY, "Equity % of Cost", format!("{:.1}%", a.equity_percent_of_cost)),
        ];
        if let Some(dscr) = a.dscr {
            rows.push(row(HOLD, "DSCR", format!("{:.2}", dscr)));
        }
        rows
    }
}
