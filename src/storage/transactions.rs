//! Transaction repository and ledger aggregations

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::EstateResult;
use crate::models::{AssetId, Money, ProjectId, Transaction, TransactionId, TransactionKind};

use super::push_filter;

const COLUMNS: &str = "id, date, kind, amount, category, description, reference, payee, \
    asset_id, project_id, is_reconciled, created_at, updated_at";

/// Filters for listing transactions; `to` is inclusive
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub asset_id: Option<AssetId>,
    pub project_id: Option<ProjectId>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

/// Income and expense totals for one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthTotals {
    pub year: i32,
    pub month: u32,
    pub income: Money,
    pub expense: Money,
}

pub struct TransactionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
        Ok(Transaction {
            id: row.get(0)?,
            date: row.get(1)?,
            kind: row.get(2)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            description: row.get(5)?,
            reference: row.get(6)?,
            payee: row.get(7)?,
            asset_id: row.get(8)?,
            project_id: row.get(9)?,
            is_reconciled: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    pub fn insert(&self, txn: &Transaction) -> EstateResult<TransactionId> {
        self.conn.execute(
            "INSERT INTO transactions (date, kind, amount, category, description, reference,
                payee, asset_id, project_id, is_reconciled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                txn.date,
                txn.kind,
                txn.amount,
                txn.category,
                txn.description,
                txn.reference,
                txn.payee,
                txn.asset_id,
                txn.project_id,
                txn.is_reconciled,
                txn.created_at,
                txn.updated_at,
            ],
        )?;
        Ok(TransactionId::new(self.conn.last_insert_rowid()))
    }

    pub fn get(&self, id: TransactionId) -> EstateResult<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions WHERE id = ?1", COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::from_row)
            .optional()?)
    }

    /// Transactions matching the filter, newest first
    pub fn list(&self, filter: &TransactionFilter) -> EstateResult<Vec<Transaction>> {
        let mut sql = format!("SELECT {} FROM transactions WHERE 1=1", COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        push_filter(&mut sql, &mut params_vec, "asset_id = ?", filter.asset_id);
        push_filter(&mut sql, &mut params_vec, "project_id = ?", filter.project_id);
        push_filter(&mut sql, &mut params_vec, "kind = ?", filter.kind);
        push_filter(
            &mut sql,
            &mut params_vec,
            "LOWER(category) = LOWER(?)",
            filter.category.clone(),
        );
        push_filter(&mut sql, &mut params_vec, "date >= ?", filter.from);
        push_filter(&mut sql, &mut params_vec, "date <= ?", filter.to);
        sql.push_str(" ORDER BY date DESC, id DESC");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        debug!(%sql, "Listing transactions");
        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn update(&self, txn: &Transaction) -> EstateResult<bool> {
        let changed = self.conn.execute(
            "UPDATE transactions SET date = ?2, kind = ?3, amount = ?4, category = ?5,
                description = ?6, reference = ?7, payee = ?8, asset_id = ?9, project_id = ?10,
                is_reconciled = ?11, updated_at = ?12
             WHERE id = ?1",
            params![
                txn.id,
                txn.date,
                txn.kind,
                txn.amount,
                txn.category,
                txn.description,
                txn.reference,
                txn.payee,
                txn.asset_id,
                txn.project_id,
                txn.is_reconciled,
                txn.updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: TransactionId) -> EstateResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Sum of income minus sum of expense over every transaction
    pub fn cash_balance(&self) -> EstateResult<Money> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE -amount END), 0)
             FROM transactions",
            [],
            |row| row.get(0),
        )?)
    }

    /// Total of one kind over `[from, to_exclusive)`
    pub fn sum_between(
        &self,
        kind: TransactionKind,
        from: NaiveDate,
        to_exclusive: NaiveDate,
    ) -> EstateResult<Money> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions
             WHERE kind = ?1 AND date >= ?2 AND date < ?3",
            params![kind, from, to_exclusive],
            |row| row.get(0),
        )?)
    }

    /// Per-month income and expense over `[from, to_exclusive)`.
    ///
    /// Months without transactions are absent.
    pub fn month_totals(
        &self,
        from: NaiveDate,
        to_exclusive: NaiveDate,
    ) -> EstateResult<Vec<MonthTotals>> {
        let mut stmt = self.conn.prepare(
            "SELECT CAST(strftime('%Y', date) AS INTEGER) AS y,
                    CAST(strftime('%m', date) AS INTEGER) AS m,
                    COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0),
                    COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0)
             FROM transactions
             WHERE date >= ?1 AND date < ?2
             GROUP BY y, m
             ORDER BY y, m",
        )?;
        let rows = stmt.query_map(params![from, to_exclusive], |row| {
            Ok(MonthTotals {
                year: row.get(0)?,
                month: row.get(1)?,
                income: row.get(2)?,
                expense: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Totals per category for one kind over `[from, to_exclusive)`, largest first
    pub fn category_totals(
        &self,
        kind: TransactionKind,
        from: NaiveDate,
        to_exclusive: NaiveDate,
    ) -> EstateResult<Vec<(String, Money)>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(NULLIF(category, ''), 'Uncategorised') AS cat, SUM(amount) AS total
             FROM transactions
             WHERE kind = ?1 AND date >= ?2 AND date < ?3
             GROUP BY cat
             ORDER BY total DESC, cat",
        )?;
        let rows = stmt.query_map(params![kind, from, to_exclusive], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count(&self) -> EstateResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add(storage: &Storage, d: NaiveDate, kind: TransactionKind, dollars: i64, cat: &str) {
        let mut txn = Transaction::new(d, kind, Money::from_dollars(dollars));
        txn.category = Some(cat.to_string());
        storage.transactions().insert(&txn).unwrap();
    }

    #[test]
    fn test_cash_balance() {
        let storage = Storage::in_memory().unwrap();
        assert!(storage.transactions().cash_balance().unwrap().is_zero());

        add(&storage, date(2025, 1, 5), TransactionKind::Income, 1_000, "Rent");
        add(&storage, date(2025, 1, 9), TransactionKind::Expense, 300, "Rates");
        add(&storage, date(2025, 2, 1), TransactionKind::Expense, 50, "Repairs");
        assert_eq!(
            storage.transactions().cash_balance().unwrap(),
            Money::from_dollars(650)
        );
    }

    #[test]
    fn test_month_boundaries() {
        let storage = Storage::in_memory().unwrap();
        add(&storage, date(2025, 1, 31), TransactionKind::Income, 10, "Rent");
        add(&storage, date(2025, 2, 1), TransactionKind::Income, 20, "Rent");
        add(&storage, date(2025, 2, 28), TransactionKind::Income, 40, "Rent");
        add(&storage, date(2025, 3, 1), TransactionKind::Income, 80, "Rent");

        let total = storage
            .transactions()
            .sum_between(TransactionKind::Income, date(2025, 2, 1), date(2025, 3, 1))
            .unwrap();
        assert_eq!(total, Money::from_dollars(60));
    }

    #[test]
    fn test_month_totals_are_sparse_and_ordered() {
        let storage = Storage::in_memory().unwrap();
        add(&storage, date(2025, 3, 2), TransactionKind::Expense, 5, "Rates");
        add(&storage, date(2025, 1, 2), TransactionKind::Income, 7, "Rent");

        let totals = storage
            .transactions()
            .month_totals(date(2025, 1, 1), date(2025, 4, 1))
            .unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!((totals[0].year, totals[0].month), (2025, 1));
        assert_eq!(totals[0].income, Money::from_dollars(7));
        assert!(totals[0].expense.is_zero());
        assert_eq!(totals[1].expense, Money::from_dollars(5));
    }

    #[test]
    fn test_category_totals() {
        let storage = Storage::in_memory().unwrap();
        add(&storage, date(2025, 1, 2), TransactionKind::Expense, 5, "Rates");
        add(&storage, date(2025, 1, 3), TransactionKind::Expense, 7, "Rates");
        add(&storage, date(2025, 1, 4), TransactionKind::Expense, 20, "Insurance");
        add(&storage, date(2025, 1, 4), TransactionKind::Income, 99, "Rent");

        let totals = storage
            .transactions()
            .category_totals(TransactionKind::Expense, date(2025, 1, 1), date(2025, 2, 1))
            .unwrap();
        assert_eq!(
            totals,
            vec![
                ("Insurance".to_string(), Money::from_dollars(20)),
                ("Rates".to_string(), Money::from_dollars(12)),
            ]
        );
    }

    #[test]
    fn test_list_newest_first_with_limit() {
        let storage = Storage::in_memory().unwrap();
        add(&storage, date(2025, 1, 1), TransactionKind::Income, 1, "Rent");
        add(&storage, date(2025, 3, 1), TransactionKind::Income, 3, "Rent");
        add(&storage, date(2025, 2, 1), TransactionKind::Income, 2, "Rent");

        let filter = TransactionFilter {
            limit: Some(2),
            ..Default::default()
        };
        let listed = storage.transactions().list(&filter).unwrap();
        let dates: Vec<_> = listed.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date(2025, 3, 1), date(2025, 2, 1)]);
    }

    #[test]
    fn test_non_positive_amount_rejected_by_schema() {
        let storage = Storage::in_memory().unwrap();
        let txn = Transaction::new(date(2025, 1, 1), TransactionKind::Income, Money::zero());
        let err = storage.transactions().insert(&txn).unwrap_err();
        assert!(err.is_integrity());
    }
}
