//! Finance CLI commands: cash position, cash-flow trend and the loan calculators

use clap::{Args, Subcommand, ValueEnum};

use super::{parse_choice, parse_date, parse_money, parse_opt_money, today};
use crate::config::settings::Settings;
use crate::display::expense::format_totals;
use crate::display::finance::{
    format_cashflow, format_construction_summary, format_draw_schedule, format_loan_schedule,
    format_loan_summary, format_refinance,
};
use crate::error::{EstateError, EstateResult};
use crate::finance::{
    construction, loan, ConstructionLoan, DrawProfile, DualPhaseLoan, InvestmentLoan,
    LoanValidationError,
};
use crate::models::{Money, TransactionKind, YearMonth};
use crate::reports::FinanceOverviewReport;
use crate::services::TransactionService;
use crate::storage::Storage;

/// Finance subcommands
#[derive(Subcommand)]
pub enum FinanceCommands {
    /// Cash balance, this month and the recent trend
    Overview {
        /// Months in the trend; defaults to the configured value
        #[arg(short, long)]
        months: Option<u32>,
    },
    /// Income and expense per calendar month
    Cashflow {
        #[arg(short, long)]
        months: Option<u32>,
    },
    /// Month-by-month figures for one year
    Year {
        /// Defaults to the current year
        year: Option<i32>,
    },
    /// Totals per category between two dates (inclusive)
    Categories {
        /// income or expense
        #[arg(short, long, default_value = "expense")]
        kind: String,
        /// YYYY-MM-DD
        from: String,
        /// YYYY-MM-DD
        to: String,
    },
    /// Income and expense for a single month
    Month {
        /// YYYY-MM; defaults to the current month
        month: Option<String>,
    },
}

/// Loan calculator subcommands
#[derive(Subcommand)]
pub enum LoanCommands {
    /// Post-completion investment loan
    Investment(LoanArgs),
    /// Construction facility drawn down over the build
    Construction(ConstructionArgs),
    /// Construction loan refinanced into an investment loan on completion
    #[command(alias = "refinance")]
    Dual(DualArgs),
}

/// Investment loan terms
#[derive(Args)]
pub struct InvestmentTerms {
    /// Loan-to-value ratio in percent
    #[arg(long, default_value_t = loan::DEFAULT_LVR_PERCENT)]
    pub lvr: f64,
    /// Annual interest rate in percent
    #[arg(long, default_value_t = loan::DEFAULT_RATE_PERCENT)]
    pub rate: f64,
    /// Loan term in years
    #[arg(long, default_value_t = loan::DEFAULT_TERM_YEARS)]
    pub term: u32,
    /// Interest-only years at the start of the term
    #[arg(long, default_value_t = loan::DEFAULT_IO_YEARS)]
    pub io_years: u32,
    /// Establishment fee in percent of the loan
    #[arg(long, default_value_t = loan::DEFAULT_ESTABLISHMENT_FEE_PERCENT)]
    pub fee: f64,
}

impl InvestmentTerms {
    fn apply(&self, loan: &mut InvestmentLoan) {
        loan.lvr_percent = self.lvr;
        loan.rate_percent = self.rate;
        loan.term_years = self.term;
        loan.io_years = self.io_years;
        loan.establishment_fee_percent = self.fee;
    }
}

/// Shape of the construction draw-down
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DrawShape {
    SCurve,
    Linear,
}

/// Construction facility terms
#[derive(Args)]
pub struct ConstructionTerms {
    /// Build duration in months
    #[arg(long, default_value_t = construction::DEFAULT_DURATION_MONTHS)]
    pub months: u32,
    /// Loan-to-cost ratio in percent
    #[arg(long, default_value_t = construction::DEFAULT_LTC_PERCENT)]
    pub ltc: f64,
    /// Annual construction interest rate in percent
    #[arg(long, default_value_t = construction::DEFAULT_CONSTRUCTION_RATE_PERCENT)]
    pub build_rate: f64,
    /// Construction establishment fee in percent of the facility
    #[arg(long, default_value_t = construction::DEFAULT_CONSTRUCTION_FEE_PERCENT)]
    pub build_fee: f64,
    /// Line fee in percent of the facility
    #[arg(long, default_value_t = construction::DEFAULT_LINE_FEE_PERCENT)]
    pub line_fee: f64,
    /// Draw-down shape
    #[arg(long, value_enum, default_value = "s-curve")]
    pub profile: DrawShape,
    /// Comma-separated monthly draw weights; overrides --profile
    #[arg(long, value_delimiter = ',')]
    pub draws: Vec<f64>,
    /// Pay construction interest from equity instead of capitalising it
    #[arg(long)]
    pub no_capitalise: bool,
}

impl ConstructionTerms {
    fn build(&self, development_cost: Money) -> ConstructionLoan {
        let mut loan = ConstructionLoan::new(development_cost);
        loan.duration_months = self.months;
        loan.ltc_percent = self.ltc;
        loan.rate_percent = self.build_rate;
        loan.establishment_fee_percent = self.build_fee;
        loan.line_fee_percent = self.line_fee;
        loan.capitalise_interest = !self.no_capitalise;
        loan.profile = if !self.draws.is_empty() {
            DrawProfile::Custom(self.draws.clone())
        } else {
            match self.profile {
                DrawShape::SCurve => DrawProfile::SCurve,
                DrawShape::Linear => DrawProfile::Linear,
            }
        };
        loan
    }
}

/// Investment loan arguments
#[derive(Args)]
pub struct LoanArgs {
    /// Property value
    pub value: String,
    #[command(flatten)]
    pub terms: InvestmentTerms,
    /// Annual net operating income, for DSCR
    #[arg(long)]
    pub noi: Option<String>,
    /// Print the repayment schedule, one row every N months
    #[arg(long)]
    pub schedule: Option<usize>,
}

/// Construction loan arguments
#[derive(Args)]
pub struct ConstructionArgs {
    /// Total development cost
    pub cost: String,
    #[command(flatten)]
    pub terms: ConstructionTerms,
    /// Print the monthly draw schedule
    #[arg(long)]
    pub schedule: bool,
}

/// Construction-to-investment refinance arguments
#[derive(Args)]
pub struct DualArgs {
    /// Total development cost
    pub cost: String,
    /// Value of the completed asset
    pub value: String,
    #[command(flatten)]
    pub construction: ConstructionTerms,
    #[command(flatten)]
    pub investment: InvestmentTerms,
    /// Annual net operating income, for DSCR
    #[arg(long)]
    pub noi: Option<String>,
}

/// Handle a finance command
pub fn handle_finance_command(
    storage: &Storage,
    settings: &Settings,
    cmd: FinanceCommands,
) -> EstateResult<()> {
    let service = TransactionService::new(storage);

    match cmd {
        FinanceCommands::Overview { months } => {
            let months = months.unwrap_or(settings.trend_months);
            let report = FinanceOverviewReport::generate(storage, today(), months)?;
            print!("{}", report.format_terminal());
        }

        FinanceCommands::Cashflow { months } => {
            let months = months.unwrap_or(settings.trend_months);
            print!("{}", format_cashflow(&service.cashflow_trend(months, today())?));
        }

        FinanceCommands::Year { year } => {
            let year = year.unwrap_or_else(|| YearMonth::of(today()).year());
            println!("Cash flow {}", year);
            print!("{}", format_cashflow(&service.yearly_summary(year)?));
        }

        FinanceCommands::Categories { kind, from, to } => {
            let kind = parse_choice(&kind, "kind", "income, expense", TransactionKind::parse)?;
            let totals =
                service.category_breakdown(kind, parse_date(&from)?, parse_date(&to)?)?;
            if totals.is_empty() {
                println!("No {} transactions between {} and {}.", kind.as_str(), from, to);
            } else {
                print!("{}", format_totals("Category", &totals));
            }
        }

        FinanceCommands::Month { month } => {
            let period = match month {
                Some(m) => super::parse_month(&m)?,
                None => YearMonth::of(today()),
            };
            let income = service.monthly_income(period.year(), period.month())?;
            let expense = service.monthly_expense(period.year(), period.month())?;
            println!("{}", period);
            println!("  Income:  {:>16}", income);
            println!("  Expense: {:>16}", expense);
            println!("  Net:     {:>16}", income - expense);
        }
    }

    Ok(())
}

fn invalid_loan(err: LoanValidationError) -> EstateError {
    EstateError::Validation(err.to_string())
}

/// Handle a loan command
pub fn handle_loan_command(cmd: LoanCommands) -> EstateResult<()> {
    match cmd {
        LoanCommands::Investment(args) => {
            let mut loan = InvestmentLoan::new(parse_money(&args.value, "property value")?);
            args.terms.apply(&mut loan);
            loan.validate().map_err(invalid_loan)?;

            let noi = parse_opt_money(args.noi.as_deref(), "net operating income")?;
            print!("{}", format_loan_summary(&loan, noi));

            if let Some(step) = args.schedule {
                println!();
                print!("{}", format_loan_schedule(&loan.schedule(), step));
            }
        }

        LoanCommands::Construction(args) => {
            let loan = args
                .terms
                .build(parse_money(&args.cost, "development cost")?);
            loan.validate().map_err(invalid_loan)?;
            print!("{}", format_construction_summary(&loan));

            if args.schedule {
                println!();
                print!("{}", format_draw_schedule(&loan.draw_schedule()));
            }
        }

        LoanCommands::Dual(args) => {
            let cost = parse_money(&args.cost, "development cost")?;
            let mut loan = DualPhaseLoan::new(cost, parse_money(&args.value, "completion value")?);
            loan.construction = args.construction.build(cost);
            args.investment.apply(&mut loan.investment);
            loan.annual_noi = parse_opt_money(args.noi.as_deref(), "net operating income")?;
            loan.validate().map_err(invalid_loan)?;
            print!("{}", format_refinance(&loan));
        }
    }

    Ok(())
}
