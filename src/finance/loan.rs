//! Investment loan model
//!
//! A post-completion investment loan with an optional interest-only period
//! followed by amortising principal and interest repayments. Figures use
//! typical Australian investment lending terms as defaults.

use std::fmt;

use serde::Serialize;

use crate::models::Money;

pub const DEFAULT_LVR_PERCENT: f64 = 60.0;
pub const DEFAULT_RATE_PERCENT: f64 = 6.75;
pub const DEFAULT_TERM_YEARS: u32 = 25;
pub const DEFAULT_IO_YEARS: u32 = 5;
pub const DEFAULT_ESTABLISHMENT_FEE_PERCENT: f64 = 0.5;
pub const MAX_TERM_YEARS: u32 = 50;

/// Repayment phase of a schedule row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoanPhase {
    InterestOnly,
    PrincipalAndInterest,
}

impl fmt::Display for LoanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InterestOnly => write!(f, "Interest Only"),
            Self::PrincipalAndInterest => write!(f, "Principal & Interest"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    /// 1-based month number
    pub period: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    /// Balance after this month's payment
    pub balance: f64,
    pub phase: LoanPhase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanSummary {
    pub loan_amount: Money,
    pub io_payment: Money,
    pub pi_payment: Money,
    pub total_payments: Money,
    pub total_interest: Money,
    pub establishment_fee: Money,
    pub year1_debt_service: Money,
    /// Interest plus establishment fee
    pub cost_of_borrowing: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentLoan {
    pub property_value: Money,
    pub lvr_percent: f64,
    pub rate_percent: f64,
    pub term_years: u32,
    pub io_years: u32,
    pub establishment_fee_percent: f64,
}

impl InvestmentLoan {
    /// A loan against `property_value` with default terms
    pub fn new(property_value: Money) -> Self {
        Self {
            property_value,
            lvr_percent: DEFAULT_LVR_PERCENT,
            rate_percent: DEFAULT_RATE_PERCENT,
            term_years: DEFAULT_TERM_YEARS,
            io_years: DEFAULT_IO_YEARS,
            establishment_fee_percent: DEFAULT_ESTABLISHMENT_FEE_PERCENT,
        }
    }

    pub fn validate(&self) -> Result<(), LoanValidationError> {
        if !self.property_value.is_positive() {
            return Err(LoanValidationError::NonPositiveValue);
        }
        if !(0.0..=100.0).contains(&self.lvr_percent) {
            return Err(LoanValidationError::LvrOutOfRange(self.lvr_percent));
        }
        if !self.rate_percent.is_finite() || self.rate_percent < 0.0 {
            return Err(LoanValidationError::NegativeRate);
        }
        if self.term_years == 0 {
            return Err(LoanValidationError::ZeroTerm);
        }
        if self.term_years > MAX_TERM_YEARS {
            return Err(LoanValidationError::TermTooLong(self.term_years));
        }
        if self.io_years > self.term_years {
            return Err(LoanValidationError::InterestOnlyExceedsTerm {
                io_years: self.io_years,
                term_years: self.term_years,
            });
        }
        if !self.establishment_fee_percent.is_finite() || self.establishment_fee_percent < 0.0 {
            return Err(LoanValidationError::NegativeFee);
        }
        Ok(())
    }

    pub fn loan_amount(&self) -> f64 {
        self.property_value.as_f64() * self.lvr_percent / 100.0
    }

    pub fn monthly_rate(&self) -> f64 {
        self.rate_percent / 1200.0
    }

    pub fn total_months(&self) -> u32 {
        self.term_years.saturating_mul(12)
    }

    pub fn io_months(&self) -> u32 {
        self.io_years.saturating_mul(12)
    }

    pub fn amortising_months(&self) -> u32 {
        self.total_months().saturating_sub(self.io_months())
    }

    pub fn establishment_fee(&self) -> f64 {
        self.loan_amount() * self.establishment_fee_percent / 100.0
    }

    pub fn io_payment(&self) -> f64 {
        self.loan_amount() * self.monthly_rate()
    }

    /// Standard annuity payment over the amortising months; a zero rate
    /// repays in equal instalments
    pub fn pi_payment(&self) -> f64 {
        let n = self.amortising_months();
        if n == 0 {
            return 0.0;
        }
        let principal = self.loan_amount();
        let r = self.monthly_rate();
        if r == 0.0 {
            return principal / f64::from(n);
        }
        let growth = (1.0 + r).powi(n as i32);
        principal * r * growth / (growth - 1.0)
    }

    pub fn schedule(&self) -> Vec<ScheduleRow> {
        let rate = self.monthly_rate();
        let io_payment = self.io_payment();
        let pi_payment = self.pi_payment();
        let mut balance = self.loan_amount();
        let mut rows = Vec::with_capacity(self.total_months() as usize);

        for period in 1..=self.io_months() {
            rows.push(ScheduleRow {
                period,
                payment: io_payment,
                principal: 0.0,
                interest: balance * rate,
                balance,
                phase: LoanPhase::InterestOnly,
            });
        }

        for period in self.io_months() + 1..=self.total_months() {
            let interest = balance * rate;
            let principal = pi_payment - interest;
            balance = (balance - principal).max(0.0);
            rows.push(ScheduleRow {
                period,
                payment: pi_payment,
                principal,
                interest,
                balance,
                phase: LoanPhase::PrincipalAndInterest,
            });
        }

        rows
    }

    pub fn summary(&self) -> LoanSummary {
        let schedule = self.schedule();
        let total_interest: f64 = schedule.iter().map(|r| r.interest).sum();
        let total_payments: f64 = schedule.iter().map(|r| r.payment).sum();
        let year1: f64 = schedule.iter().take(12).map(|r| r.payment).sum();
        let fee = self.establishment_fee();

        LoanSummary {
            loan_amount: Money::from_f64(self.loan_amount()),
            io_payment: Money::from_f64(self.io_payment()),
            pi_payment: Money::from_f64(self.pi_payment()),
            total_payments: Money::from_f64(total_payments),
            total_interest: Money::from_f64(total_interest),
            establishment_fee: Money::from_f64(fee),
            year1_debt_service: Money::from_f64(year1),
            cost_of_borrowing: Money::from_f64(total_interest + fee),
        }
    }

    /// Debt-service coverage on interest-only year-one payments; 0 when
    /// there is no debt service
    pub fn dscr(&self, annual_noi: Money) -> f64 {
        let debt_service = self.io_payment() * 12.0;
        if debt_service > 0.0 {
            annual_noi.as_f64() / debt_service
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoanValidationError {
    NonPositiveValue,
    LvrOutOfRange(f64),
    NegativeRate,
    ZeroTerm,
    TermTooLong(u32),
    InterestOnlyExceedsTerm { io_years: u32, term_years: u32 },
    NegativeFee,
    NonPositiveCost,
    ZeroDuration,
    DurationTooLong(u32),
    InvalidDrawWeights,
}

impl fmt::Display for LoanValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveValue => write!(f, "Property value must be positive"),
            Self::LvrOutOfRange(lvr) => write!(f, "LVR must be between 0 and 100 (got {})", lvr),
            Self::NegativeRate => write!(f, "Interest rate cannot be negative"),
            Self::ZeroTerm => write!(f, "Loan term must be at least one year"),
            Self::TermTooLong(years) => write!(
                f,
                "Loan term cannot exceed {} years (got {})",
                MAX_TERM_YEARS, years
            ),
            Self::InterestOnlyExceedsTerm { io_years, term_years } => write!(
                f,
                "Interest-only period ({} years) exceeds loan term ({} years)",
                io_years, term_years
            ),
            Self::NegativeFee => write!(f, "Loan fees cannot be negative"),
            Self::NonPositiveCost => write!(f, "Development cost must be positive"),
            Self::ZeroDuration => write!(f, "Construction must last at least one month"),
            Self::DurationTooLong(months) => write!(
                f,
                "Construction cannot exceed {} months (got {})",
                super::construction::MAX_DURATION_MONTHS,
                months
            ),
            Self::InvalidDrawWeights => {
                write!(f, "Draw weights must be non-negative numbers")
            }
        }
    }
}

impl std::error::Error for LoanValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan() -> InvestmentLoan {
        InvestmentLoan::new(Money::from_dollars(1_000_000))
    }

    #[test]
    fn test_defaults() {
        let loan = loan();
        assert_eq!(loan.loan_amount(), 600_000.0);
        assert_eq!(loan.io_months(), 60);
        assert_eq!(loan.amortising_months(), 240);
        assert_eq!(loan.establishment_fee(), 3_000.0);
        assert!(loan.validate().is_ok());
    }

    #[test]
    fn test_io_payment() {
        // 600k at 6.75% is 3,375 a month interest-only
        assert!((loan().io_payment() - 3_375.0).abs() < 1e-6);
    }

    #[test]
    fn test_annuity_payment() {
        let mut loan = InvestmentLoan::new(Money::from_dollars(100_000));
        loan.lvr_percent = 100.0;
        loan.rate_percent = 12.0;
        loan.term_years = 1;
        loan.io_years = 0;

        // 100k over 12 months at 1% a month
        assert!((loan.pi_payment() - 8_884.878_867_9).abs() < 1e-4);

        let schedule = loan.schedule();
        assert_eq!(schedule.len(), 12);
        assert!(schedule.last().unwrap().balance < 0.01);
        let principal: f64 = schedule.iter().map(|r| r.principal).sum();
        assert!((principal - 100_000.0).abs() < 0.01);
    }

    #[test]
    fn test_zero_rate() {
        let mut loan = loan();
        loan.rate_percent = 0.0;
        assert_eq!(loan.io_payment(), 0.0);
        assert!((loan.pi_payment() - 2_500.0).abs() < 1e-9);
        assert_eq!(loan.dscr(Money::from_dollars(50_000)), 0.0);
    }

    #[test]
    fn test_schedule_phases() {
        let schedule = loan().schedule();
        assert_eq!(schedule.len(), 300);
        assert_eq!(schedule[59].phase, LoanPhase::InterestOnly);
        assert_eq!(schedule[59].balance, 600_000.0);
        assert_eq!(schedule[60].phase, LoanPhase::PrincipalAndInterest);
        assert!(schedule[60].balance < 600_000.0);
        assert!(schedule[299].balance < 0.01);
    }

    #[test]
    fn test_all_interest_only() {
        let mut loan = loan();
        loan.io_years = loan.term_years;
        assert_eq!(loan.pi_payment(), 0.0);
        assert!(loan.schedule().iter().all(|r| r.phase == LoanPhase::InterestOnly));
    }

    #[test]
    fn test_summary_and_dscr() {
        let loan = loan();
        let summary = loan.summary();
        assert_eq!(summary.loan_amount, Money::from_dollars(600_000));
        assert_eq!(summary.year1_debt_service, Money::from_dollars(40_500));
        assert_eq!(
            summary.cost_of_borrowing,
            summary.total_interest + summary.establishment_fee
        );

        // 81k NOI over 40.5k debt service
        assert!((loan.dscr(Money::from_dollars(81_000)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_validation() {
        let mut bad = loan();
        bad.io_years = 30;
        assert!(matches!(
            bad.validate(),
            Err(LoanValidationError::InterestOnlyExceedsTerm { .. })
        ));

        let mut bad = loan();
        bad.lvr_percent = 120.0;
        assert_eq!(bad.validate(), Err(LoanValidationError::LvrOutOfRange(120.0)));

        let bad = InvestmentLoan::new(Money::zero());
        assert_eq!(bad.validate(), Err(LoanValidationError::NonPositiveValue));
    }

    #[test]
    fn test_term_is_capped() {
        let mut loan = loan();
        loan.term_years = MAX_TERM_YEARS;
        assert!(loan.validate().is_ok());

        loan.term_years = 400_000_000;
        assert_eq!(
            loan.validate(),
            Err(LoanValidationError::TermTooLong(400_000_000))
        );
        // Month counts saturate instead of wrapping
        assert_eq!(loan.total_months(), u32::MAX);
    }
}
