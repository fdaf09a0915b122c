//! Construction loan model
//!
//! A development facility sized on total development cost and drawn down
//! month by month while the building goes up. Interest accrues on the drawn
//! balance (half of each month's draw counts for that month) and is either
//! capitalised into the facility or paid from equity.

use std::fmt;

use serde::Serialize;

use super::loan::LoanValidationError;
use crate::models::Money;

pub const DEFAULT_LTC_PERCENT: f64 = 65.0;
pub const DEFAULT_CONSTRUCTION_RATE_PERCENT: f64 = 8.5;
pub const DEFAULT_CONSTRUCTION_FEE_PERCENT: f64 = 1.0;
pub const DEFAULT_LINE_FEE_PERCENT: f64 = 0.5;
pub const DEFAULT_DURATION_MONTHS: u32 = 12;
pub const MAX_DURATION_MONTHS: u32 = 120;

/// How the facility is drawn across the build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawProfile {
    /// Slow start and finish, peak spend mid-build
    SCurve,
    /// Equal draws every month
    Linear,
    /// Relative monthly weights, normalised to the full facility
    Custom(Vec<f64>),
}

impl fmt::Display for DrawProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SCurve => write!(f, "S-curve"),
            Self::Linear => write!(f, "Linear"),
            Self::Custom(weights) => write!(f, "Custom ({} months)", weights.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawRow {
    /// 1-based construction month
    pub month: u32,
    pub draw: f64,
    /// Share of the facility drawn this month, in percent
    pub draw_percent: f64,
    pub cumulative_drawn: f64,
    pub interest: f64,
    pub cumulative_interest: f64,
    /// Drawn balance plus capitalised interest
    pub outstanding: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructionSummary {
    pub loan_amount: Money,
    pub establishment_fee: Money,
    pub line_fee: Money,
    pub total_fees: Money,
    pub total_drawn: Money,
    pub total_interest: Money,
    /// Final outstanding balance plus fees; what a refinance has to repay
    pub loan_at_completion: Money,
    /// Development cost not covered by the facility
    pub equity_required: Money,
    /// Interest and fees over the facility, annualised
    pub effective_rate_percent: f64,
    pub interest_percent_of_loan: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructionLoan {
    pub development_cost: Money,
    pub duration_months: u32,
    pub ltc_percent: f64,
    pub rate_percent: f64,
    pub establishment_fee_percent: f64,
    pub line_fee_percent: f64,
    pub capitalise_interest: bool,
    pub profile: DrawProfile,
}

impl ConstructionLoan {
    /// A facility against `development_cost` with default terms and an S-curve draw
    pub fn new(development_cost: Money) -> Self {
        Self {
            development_cost,
            duration_months: DEFAULT_DURATION_MONTHS,
            ltc_percent: DEFAULT_LTC_PERCENT,
            rate_percent: DEFAULT_CONSTRUCTION_RATE_PERCENT,
            establishment_fee_percent: DEFAULT_CONSTRUCTION_FEE_PERCENT,
            line_fee_percent: DEFAULT_LINE_FEE_PERCENT,
            capitalise_interest: true,
            profile: DrawProfile::SCurve,
        }
    }

    pub fn validate(&self) -> Result<(), LoanValidationError> {
        if !self.development_cost.is_positive() {
            return Err(LoanValidationError::NonPositiveCost);
        }
        if self.duration_months == 0 {
            return Err(LoanValidationError::ZeroDuration);
        }
        if self.duration_months > MAX_DURATION_MONTHS {
            return Err(LoanValidationError::DurationTooLong(self.duration_months));
        }
        if !(0.0..=100.0).contains(&self.ltc_percent) {
            return Err(LoanValidationError::LvrOutOfRange(self.ltc_percent));
        }
        if !self.rate_percent.is_finite() || self.rate_percent < 0.0 {
            return Err(LoanValidationError::NegativeRate);
        }
        for fee in [self.establishment_fee_percent, self.line_fee_percent] {
            if !fee.is_finite() || fee < 0.0 {
                return Err(LoanValidationError::NegativeFee);
            }
        }
        if let DrawProfile::Custom(weights) = &self.profile {
            if weights.is_empty() || weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(LoanValidationError::InvalidDrawWeights);
            }
        }
        Ok(())
    }

    pub fn loan_amount(&self) -> f64 {
        self.development_cost.as_f64() * self.ltc_percent / 100.0
    }

    pub fn monthly_rate(&self) -> f64 {
        self.rate_percent / 1200.0
    }

    pub fn establishment_fee(&self) -> f64 {
        self.loan_amount() * self.establishment_fee_percent / 100.0
    }

    pub fn line_fee(&self) -> f64 {
        self.loan_amount() * self.line_fee_percent / 100.0
    }

    /// Monthly draw shares summing to 1.
    ///
    /// Custom weights beyond the build duration are ignored. Weights that sum
    /// to zero fall back to a linear draw.
    pub fn draw_weights(&self) -> Vec<f64> {
        let months = self.duration_months.max(1) as usize;
        let linear = || vec![1.0 / months as f64; months];

        match &self.profile {
            DrawProfile::Linear => linear(),
            DrawProfile::Custom(weights) => {
                let used = &weights[..weights.len().min(months)];
                let total: f64 = used.iter().sum();
                if total > 0.0 {
                    used.iter().map(|w| w / total).collect()
                } else {
                    linear()
                }
            }
            DrawProfile::SCurve => {
                // Logistic curve sampled on [-4, 4], differenced into months
                let cumulative: Vec<f64> = (0..=months)
                    .map(|i| {
                        let x = -4.0 + 8.0 * i as f64 / months as f64;
                        1.0 / (1.0 + (-x).exp())
                    })
                    .collect();
                let monthly: Vec<f64> = cumulative.windows(2).map(|w| w[1] - w[0]).collect();
                let total: f64 = monthly.iter().sum();
                monthly.iter().map(|m| m / total).collect()
            }
        }
    }

    pub fn draw_schedule(&self) -> Vec<DrawRow> {
        let loan = self.loan_amount();
        let rate = self.monthly_rate();
        let mut cumulative_drawn = 0.0;
        let mut cumulative_interest = 0.0;

        self.draw_weights()
            .into_iter()
            .zip(1u32..)
            .map(|(share, month)| {
                let draw = loan * share;
                let interest = (cumulative_drawn + draw / 2.0) * rate;
                cumulative_drawn += draw;
                cumulative_interest += interest;
                let outstanding = if self.capitalise_interest {
                    cumulative_drawn + cumulative_interest
                } else {
                    cumulative_drawn
                };
                DrawRow {
                    month,
                    draw,
                    draw_percent: share * 100.0,
                    cumulative_drawn,
                    interest,
                    cumulative_interest,
                    outstanding,
                }
            })
            .collect()
    }

    pub fn summary(&self) -> ConstructionSummary {
        let schedule = self.draw_schedule();
        let (drawn, interest, outstanding) = schedule
            .last()
            .map(|r| (r.cumulative_drawn, r.cumulative_interest, r.outstanding))
            .unwrap_or((0.0, 0.0, 0.0));
        let fees = self.establishment_fee() + self.line_fee();
        let loan = self.loan_amount();

        let (effective_rate, interest_percent) = if loan > 0.0 {
            let months = f64::from(self.duration_months.max(1));
            (
                (interest + fees) / loan * (12.0 / months) * 100.0,
                interest / loan * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        ConstructionSummary {
            loan_amount: Money::from_f64(loan),
            establishment_fee: Money::from_f64(self.establishment_fee()),
            line_fee: Money::from_f64(self.line_fee()),
            total_fees: Money::from_f64(fees),
            total_drawn: Money::from_f64(drawn),
            total_interest: Money::from_f64(interest),
            loan_at_completion: Money::from_f64(outstanding + fees),
            equity_required: Money::from_f64(self.development_cost.as_f64() - loan),
            effective_rate_percent: effective_rate,
            interest_percent_of_loan: interest_percent,
        }
    }
}
