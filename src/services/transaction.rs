//! Transaction service
//!
//! Ledger CRUD plus the cash aggregations behind the finance view: balance,
//! monthly totals, the trailing cash-flow trend and category breakdowns.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{EstateError, EstateResult};
use crate::models::{Money, Transaction, TransactionId, TransactionKind, YearMonth};
use crate::storage::{Storage, TransactionFilter};

/// Longest trailing window the cash-flow trend accepts
pub const MAX_TREND_MONTHS: u32 = 120;

/// Service for ledger entries
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Income and expense for one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashflowPoint {
    pub period: YearMonth,
    pub income: Money,
    /// Always non-negative
    pub expense: Money,
    pub net: Money,
}

impl CashflowPoint {
    pub fn new(period: YearMonth, income: Money, expense: Money) -> Self {
        Self {
            period,
            income,
            expense,
            net: income - expense,
        }
    }
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a new transaction
    pub fn add(&self, mut txn: Transaction) -> EstateResult<Transaction> {
        txn.category = normalise(txn.category);
        txn.validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;

        txn.id = self.storage.transactions().insert(&txn)?;
        info!(id = %txn.id, kind = %txn.kind, amount = %txn.amount, "Recorded transaction");

        self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            txn.description.clone(),
            &txn,
        )?;

        Ok(txn)
    }

    pub fn get(&self, id: TransactionId) -> EstateResult<Option<Transaction>> {
        self.storage.transactions().get(id)
    }

    pub fn require(&self, identifier: &str) -> EstateResult<Transaction> {
        let id = identifier
            .parse::<TransactionId>()
            .map_err(|_| EstateError::transaction_not_found(identifier))?;
        self.get(id)?
            .ok_or_else(|| EstateError::transaction_not_found(identifier))
    }

    /// Transactions matching `filter`, newest first
    pub fn list(&self, filter: &TransactionFilter) -> EstateResult<Vec<Transaction>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(EstateError::Validation(format!(
                    "Start date {} is after end date {}",
                    from, to
                )));
            }
        }
        debug!(?filter, "Listing transactions");
        self.storage.transactions().list(filter)
    }

    pub fn recent(&self, limit: usize) -> EstateResult<Vec<Transaction>> {
        self.list(&TransactionFilter {
            limit: Some(limit),
            ..Default::default()
        })
    }

    pub fn update(&self, mut txn: Transaction) -> EstateResult<Transaction> {
        let before = self
            .get(txn.id)?
            .ok_or_else(|| EstateError::transaction_not_found(txn.id.to_string()))?;

        txn.category = normalise(txn.category);
        txn.validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;
        txn.updated_at = Utc::now();
        self.storage.transactions().update(&txn)?;

        self.storage.log_update(
            EntityType::Transaction,
            txn.id.to_string(),
            txn.description.clone(),
            &before,
            &txn,
        )?;

        Ok(txn)
    }

    pub fn delete(&self, id: TransactionId) -> EstateResult<Transaction> {
        let txn = self
            .get(id)?
            .ok_or_else(|| EstateError::transaction_not_found(id.to_string()))?;

        self.storage.transactions().delete(id)?;
        info!(id = %id, "Deleted transaction");

        self.storage.log_delete(
            EntityType::Transaction,
            id.to_string(),
            txn.description.clone(),
            &txn,
        )?;

        Ok(txn)
    }

    /// Total income minus total expense
    pub fn cash_balance(&self) -> EstateResult<Money> {
        self.storage.transactions().cash_balance()
    }

    pub fn monthly_income(&self, year: i32, month: u32) -> EstateResult<Money> {
        self.month_total(TransactionKind::Income, year, month)
    }

    /// Expense for a month, as a positive amount
    pub fn monthly_expense(&self, year: i32, month: u32) -> EstateResult<Money> {
        Ok(self.month_total(TransactionKind::Expense, year, month)?.abs())
    }

    fn month_total(&self, kind: TransactionKind, year: i32, month: u32) -> EstateResult<Money> {
        let period = month_of(year, month)?;
        self.storage
            .transactions()
            .sum_between(kind, period.start_date(), period.end_exclusive())
    }

    /// Income, expense and net for the `months` calendar months ending with
    /// the month of `today`, oldest first. Months with no entries are zero.
    pub fn cashflow_trend(&self, months: u32, today: NaiveDate) -> EstateResult<Vec<CashflowPoint>> {
        if !(1..=MAX_TREND_MONTHS).contains(&months) {
            return Err(EstateError::Validation(format!(
                "Trend window must be 1-{} months, got {}",
                MAX_TREND_MONTHS, months
            )));
        }
        let periods = YearMonth::trailing(months, today);
        self.fill_months(&periods)
    }

    /// Month-by-month income and expense for one year
    pub fn yearly_summary(&self, year: i32) -> EstateResult<Vec<CashflowPoint>> {
        self.fill_months(&YearMonth::year_months(year))
    }

    fn fill_months(&self, periods: &[YearMonth]) -> EstateResult<Vec<CashflowPoint>> {
        let (first, last) = match (periods.first(), periods.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Ok(Vec::new()),
        };

        let totals = self
            .storage
            .transactions()
            .month_totals(first.start_date(), last.end_exclusive())?;

        Ok(periods
            .iter()
            .map(|period| {
                totals
                    .iter()
                    .find(|t| t.year == period.year() && t.month == period.month())
                    .map(|t| CashflowPoint::new(*period, t.income, t.expense.abs()))
                    .unwrap_or_else(|| CashflowPoint::new(*period, Money::zero(), Money::zero()))
            })
            .collect())
    }

    /// Totals per category for `[from, to]`, largest first
    pub fn category_breakdown(
        &self,
        kind: TransactionKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EstateResult<Vec<(String, Money)>> {
        if from > to {
            return Err(EstateError::Validation(format!(
                "Start date {} is after end date {}",
                from, to
            )));
        }
        let to_exclusive = to.succ_opt().unwrap_or(to);
        self.storage
            .transactions()
            .category_totals(kind, from, to_exclusive)
    }
}

fn month_of(year: i32, month: u32) -> EstateResult<YearMonth> {
    YearMonth::new(year, month)
        .ok_or_else(|| EstateError::Validation(format!("Month must be 1-12, got {}", month)))
}

fn normalise(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add(service: &TransactionService, d: NaiveDate, kind: TransactionKind, dollars: i64, cat: &str) {
        let mut txn = Transaction::new(d, kind, Money::from_dollars(dollars));
        txn.category = Some(cat.to_string());
        service.add(txn).unwrap();
    }

    #[test]
    fn test_add_rejects_non_positive_amount() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        let txn = Transaction::new(date(2025, 1, 1), TransactionKind::Expense, Money::from_dollars(-5));
        assert!(service.add(txn).unwrap_err().is_validation());
        let txn = Transaction::new(date(2025, 1, 1), TransactionKind::Expense, Money::zero());
        assert!(service.add(txn).unwrap_err().is_validation());
    }

    #[test]
    fn test_blank_category_is_cleared() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        let mut txn = Transaction::new(date(2025, 1, 1), TransactionKind::Income, Money::from_dollars(5));
        txn.category = Some("   ".into());
        let saved = service.add(txn).unwrap();
        assert!(saved.category.is_none());
    }

    #[test]
    fn test_cash_balance_and_monthly_totals() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        add(&service, date(2025, 3, 1), TransactionKind::Income, 45_000, "Rent");
        add(&service, date(2025, 3, 15), TransactionKind::Expense, 2_500, "Maintenance");
        add(&service, date(2025, 3, 31), TransactionKind::Expense, 500, "Insurance");
        add(&service, date(2025, 4, 1), TransactionKind::Income, 1_000, "Rent");

        assert_eq!(service.cash_balance().unwrap(), Money::from_dollars(43_000));
        assert_eq!(service.monthly_income(2025, 3).unwrap(), Money::from_dollars(45_000));
        assert_eq!(service.monthly_expense(2025, 3).unwrap(), Money::from_dollars(3_000));
        assert!(!service.monthly_expense(2025, 3).unwrap().is_negative());
        assert_eq!(service.monthly_income(2025, 2).unwrap(), Money::zero());
        assert!(service.monthly_income(2025, 13).unwrap_err().is_validation());
    }

    #[test]
    fn test_cashflow_trend_fills_empty_months() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        add(&service, date(2025, 1, 10), TransactionKind::Income, 100, "Rent");
        add(&service, date(2025, 3, 10), TransactionKind::Expense, 40, "Rates");
        // Outside the window
        add(&service, date(2024, 6, 10), TransactionKind::Income, 999, "Rent");

        let trend = service.cashflow_trend(3, date(2025, 3, 20)).unwrap();
        assert_eq!(trend.len(), 3);
        let periods: Vec<String> = trend.iter().map(|p| p.period.to_string()).collect();
        assert_eq!(periods, vec!["2025-01", "2025-02", "2025-03"]);

        assert_eq!(trend[0].income, Money::from_dollars(100));
        assert_eq!(trend[1].income, Money::zero());
        assert_eq!(trend[1].expense, Money::zero());
        assert_eq!(trend[2].expense, Money::from_dollars(40));
        assert_eq!(trend[2].net, Money::from_dollars(-40));
    }

    #[test]
    fn test_cashflow_trend_crosses_year_boundary() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        let trend = service.cashflow_trend(4, date(2025, 2, 1)).unwrap();
        let periods: Vec<String> = trend.iter().map(|p| p.period.to_string()).collect();
        assert_eq!(periods, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);
    }

    #[test]
    fn test_cashflow_trend_window_is_bounded() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        let today = date(2025, 2, 1);
        assert!(service.cashflow_trend(0, today).unwrap_err().is_validation());
        assert!(service
            .cashflow_trend(4_000_000_000, today)
            .unwrap_err()
            .is_validation());
        let widest = service.cashflow_trend(MAX_TREND_MONTHS, today).unwrap();
        assert_eq!(widest.len(), 120);
        assert_eq!(widest[0].period.to_string(), "2015-03");
    }

    #[test]
    fn test_yearly_summary() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        add(&service, date(2025, 6, 1), TransactionKind::Income, 10, "Rent");
        let summary = service.yearly_summary(2025).unwrap();
        assert_eq!(summary.len(), 12);
        assert_eq!(summary[5].income, Money::from_dollars(10));
        assert_eq!(summary[0].income, Money::zero());
    }

    #[test]
    fn test_category_breakdown() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        add(&service, date(2025, 3, 1), TransactionKind::Expense, 10, "Rates");
        add(&service, date(2025, 3, 2), TransactionKind::Expense, 30, "Maintenance");
        add(&service, date(2025, 3, 31), TransactionKind::Expense, 5, "Rates");

        let breakdown = service
            .category_breakdown(TransactionKind::Expense, date(2025, 3, 1), date(2025, 3, 31))
            .unwrap();
        assert_eq!(
            breakdown,
            vec![
                ("Maintenance".to_string(), Money::from_dollars(30)),
                ("Rates".to_string(), Money::from_dollars(15)),
            ]
        );
    }

    #[test]
    fn test_update_and_delete() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        let mut txn = service
            .add(Transaction::new(date(2025, 1, 1), TransactionKind::Income, Money::from_dollars(5)))
            .unwrap();
        txn.amount = Money::from_dollars(7);
        service.update(txn.clone()).unwrap();
        assert_eq!(service.cash_balance().unwrap(), Money::from_dollars(7));

        service.delete(txn.id).unwrap();
        assert!(service.get(txn.id).unwrap().is_none());
        assert!(service.delete(txn.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_recent_is_newest_first() {
        let storage = Storage::in_memory().unwrap();
        let service = TransactionService::new(&storage);
        add(&service, date(2025, 1, 1), TransactionKind::Income, 1, "A");
        add(&service, date(2025, 2, 1), TransactionKind::Income, 2, "B");
        add(&service, date(2025, 3, 1), TransactionKind::Income, 3, "C");

        let recent = service.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date, date(2025, 3, 1));
    }
}
