//! Finance Overview Report
//!
//! Cash position, the current month's income and expense, and a trailing
//! monthly trend.

use chrono::NaiveDate;
use std::io::Write;

use crate::display::fmt_date;
use crate::error::{EstateError, EstateResult};
use crate::models::{Money, YearMonth};
use crate::services::{CashflowPoint, ProjectService, TransactionService};
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct FinanceOverviewReport {
    /// Date the report was generated for
    pub as_of: NaiveDate,
    pub cash_balance: Money,
    pub month: YearMonth,
    pub month_income: Money,
    /// Absolute value
    pub month_expense: Money,
    pub active_projects: i64,
    pub total_budget: Money,
    pub total_actual_cost: Money,
    /// Oldest month first
    pub trend: Vec<CashflowPoint>,
}

impl FinanceOverviewReport {
    pub fn generate(storage: &Storage, today: NaiveDate, months: u32) -> EstateResult<Self> {
        let transactions = TransactionService::new(storage);
        let projects = ProjectService::new(storage);
        let month = YearMonth::of(today);

        Ok(Self {
            as_of: today,
            cash_balance: transactions.cash_balance()?,
            month,
            month_income: transactions.monthly_income(month.year(), month.month())?,
            month_expense: transactions.monthly_expense(month.year(), month.month())?,
            active_projects: projects.active_projects_count()?,
            total_budget: projects.total_budget()?,
            total_actual_cost: projects.total_actual_cost()?,
            trend: transactions.cashflow_trend(months, today)?,
        })
    }

    pub fn month_net(&self) -> Money {
        self.month_income - self.month_expense
    }

    pub fn trend_net(&self) -> Money {
        self.trend.iter().map(|p| p.net).sum()
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Finance Overview as of {}\n", fmt_date(self.as_of)));
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!("{:<28} {:>16}\n", "Cash Balance:", self.cash_balance));
        output.push_str(&format!(
            "{:<28} {:>16}\n",
            format!("Income ({}):", self.month),
            self.month_income
        ));
        output.push_str(&format!(
            "{:<28} {:>16}\n",
            format!("Expenses ({}):", self.month),
            self.month_expense
        ));
        output.push_str(&format!("{:<28} {:>16}\n", "Net This Month:", self.month_net()));
        output.push_str(&format!("{:<28} {:>16}\n", "Active Projects:", self.active_projects));
        output.push_str(&format!("{:<28} {:>16}\n", "Total Project Budget:", self.total_budget));
        output.push_str(&format!("{:<28} {:>16}\n\n", "Total Actual Cost:", self.total_actual_cost));

        output.push_str(&format!(
            "{:<10} {:>16} {:>16} {:>16}\n",
            "Month", "Income", "Expense", "Net"
        ));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for point in &self.trend {
            output.push_str(&format!(
                "{:<10} {:>16} {:>16} {:>16}\n",
                point.period.to_string(),
                point.income,
                point.expense,
                point.net
            ));
        }

        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("{:<10} {:>50}\n", "NET", self.trend_net()));

        output
    }

    /// Export the trend table to CSV
    pub fn export_csv<W: Write>(&self, writer: &mut W) -> EstateResult<()> {
        writeln!(writer, "Month,Income,Expense,Net")
            .map_err(|e| EstateError::Export(e.to_string()))?;

        for point in &self.trend {
            writeln!(
                writer,
                "{},{:.2},{:.2},{:.2}",
                point.period,
                point.income.as_f64(),
                point.expense.as_f64(),
                point.net.as_f64()
            )
            .map_err(|e| EstateError::Export(e.to_string()))?;
        }

        writeln!(writer, "Cash Balance,,,{:.2}", self.cash_balance.as_f64())
            .map_err(|e| EstateError::Export(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Transaction, TransactionKind};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> Storage {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        for (day, kind, dollars) in [
            (date(2025, 3, 1), TransactionKind::Income, 10_000),
            (date(2025, 3, 15), TransactionKind::Expense, 2_500),
            (date(2025, 1, 5), TransactionKind::Expense, 1_000),
        ] {
            service
                .add(Transaction::new(day, kind, Money::from_dollars(dollars)))
                .unwrap();
        }
        storage
    }

    #[test]
    fn test_generate() {
        let storage = seeded();
        let report = FinanceOverviewReport::generate(&storage, date(2025, 3, 20), 3).unwrap();

        assert_eq!(report.cash_balance, Money::from_dollars(6_500));
        assert_eq!(report.month_income, Money::from_dollars(10_000));
        assert_eq!(report.month_expense, Money::from_dollars(2_500));
        assert_eq!(report.trend.len(), 3);
        assert_eq!(report.trend[0].period.to_string(), "2025-01");
        assert_eq!(report.trend[1].net, Money::zero());
        assert_eq!(report.trend_net(), Money::from_dollars(6_500));
    }

    #[test]
    fn test_format_and_csv() {
        let storage = seeded();
        let report = FinanceOverviewReport::generate(&storage, date(2025, 3, 20), 2).unwrap();

        let text = report.format_terminal();
        assert!(text.contains("Finance Overview as of 2025-03-20"));
        assert!(text.contains("2025-02"));

        let mut csv = Vec::new();
        report.export_csv(&mut csv).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert!(csv.starts_with("Month,Income,Expense,Net\n"));
        assert!(csv.contains("2025-03,10000.00,2500.00,7500.00"));
        assert!(csv.contains("Cash Balance,,,6500.00"));
    }

    #[test]
    fn test_empty_database() {
        let storage = Storage::in_memory().unwrap();
        let report = FinanceOverviewReport::generate(&storage, date(2025, 3, 20), 6).unwrap();
        assert!(report.cash_balance.is_zero());
        assert_eq!(report.trend.len(), 6);
        assert!(report.trend.iter().all(|p| p.net.is_zero()));
    }
}
