//! Monthly expense and import batch repositories

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::EstateResult;
use crate::models::{
    AssetId, ExpenseId, ImportAction, ImportBatch, ImportRecord, ImportStatus, Money,
    MonthlyExpense, ProjectId, YearMonth,
};

use super::push_filter;

const COLUMNS: &str = "id, asset_id, project_id, year, month, category, amount, currency, notes, \
    created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub asset_id: Option<AssetId>,
    pub project_id: Option<ProjectId>,
    pub year: Option<i32>,
    pub category: Option<String>,
}

/// Result of writing a monthly expense by key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseWrite {
    pub id: ExpenseId,
    pub action: ImportAction,
    /// Amount replaced by an update
    pub previous_amount: Option<Money>,
}

pub struct ExpenseRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ExpenseRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<MonthlyExpense> {
        Ok(MonthlyExpense {
            id: row.get(0)?,
            asset_id: row.get(1)?,
            project_id: row.get(2)?,
            year: row.get(3)?,
            month: row.get(4)?,
            category: row.get(5)?,
            amount: row.get(6)?,
            currency: row.get(7)?,
            notes: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    pub fn get(&self, id: ExpenseId) -> EstateResult<Option<MonthlyExpense>> {
        let sql = format!("SELECT {} FROM monthly_expenses WHERE id = ?1", COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::from_row)
            .optional()?)
    }

    /// The row holding the same (asset, project, category, year, month) key
    pub fn find_by_key(&self, expense: &MonthlyExpense) -> EstateResult<Option<MonthlyExpense>> {
        let sql = format!(
            "SELECT {} FROM monthly_expenses
             WHERE asset_id IS ?1 AND project_id IS ?2 AND category = ?3
               AND year = ?4 AND month = ?5",
            COLUMNS
        );
        Ok(self
            .conn
            .query_row(
                &sql,
                params![
                    expense.asset_id,
                    expense.project_id,
                    expense.category,
                    expense.year,
                    expense.month
                ],
                Self::from_row,
            )
            .optional()?)
    }

    /// Insert, or update the amount and notes of the row with the same key
    pub fn upsert(&self, expense: &MonthlyExpense) -> EstateResult<ExpenseWrite> {
        if let Some(existing) = self.find_by_key(expense)? {
            self.conn.execute(
                "UPDATE monthly_expenses SET amount = ?2, currency = ?3,
                    notes = CASE WHEN ?4 = '' THEN notes ELSE ?4 END, updated_at = ?5
                 WHERE id = ?1",
                params![
                    existing.id,
                    expense.amount,
                    expense.currency,
                    expense.notes,
                    expense.updated_at
                ],
            )?;
            return Ok(ExpenseWrite {
                id: existing.id,
                action: ImportAction::Updated,
                previous_amount: Some(existing.amount),
            });
        }

        self.conn.execute(
            "INSERT INTO monthly_expenses (asset_id, project_id, year, month, category, amount,
                currency, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                expense.asset_id,
                expense.project_id,
                expense.year,
                expense.month,
                expense.category,
                expense.amount,
                expense.currency,
                expense.notes,
                expense.created_at,
                expense.updated_at,
            ],
        )?;
        Ok(ExpenseWrite {
            id: ExpenseId::new(self.conn.last_insert_rowid()),
            action: ImportAction::Inserted,
            previous_amount: None,
        })
    }

    pub fn set_amount(&self, id: ExpenseId, amount: Money) -> EstateResult<bool> {
        let changed = self.conn.execute(
            "UPDATE monthly_expenses SET amount = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, amount, chrono::Utc::now()],
        )?;
        Ok(changed > 0)
    }

    /// Expenses ordered by period then category
    pub fn list(&self, filter: &ExpenseFilter) -> EstateResult<Vec<MonthlyExpense>> {
        let mut sql = format!("SELECT {} FROM monthly_expenses WHERE 1=1", COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        push_filter(&mut sql, &mut params_vec, "asset_id = ?", filter.asset_id);
        push_filter(&mut sql, &mut params_vec, "project_id = ?", filter.project_id);
        push_filter(&mut sql, &mut params_vec, "year = ?", filter.year);
        push_filter(
            &mut sql,
            &mut params_vec,
            "LOWER(category) = LOWER(?)",
            filter.category.clone(),
        );
        sql.push_str(" ORDER BY year, month, category");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn delete(&self, id: ExpenseId) -> EstateResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM monthly_expenses WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Clear `project_id` on every row whose project is in `project_set`, an
    /// SQL list or subquery bound to `?1`.
    ///
    /// A detached row whose key already exists without a project is folded
    /// into that row; rows from several projects sharing a key collapse into
    /// one. Amounts are summed. Returns the number of rows folded away.
    /// Call inside a transaction.
    pub fn detach_projects(&self, project_set: &str, key: &dyn rusqlite::ToSql) -> EstateResult<usize> {
        let same_key = "IFNULL(d.asset_id, 0) = IFNULL(monthly_expenses.asset_id, 0)
             AND d.category = monthly_expenses.category
             AND d.year = monthly_expenses.year AND d.month = monthly_expenses.month";
        let now = chrono::Utc::now();

        // Into existing project-less rows
        self.conn.execute(
            &format!(
                "UPDATE monthly_expenses
                 SET amount = amount + (SELECT SUM(d.amount) FROM monthly_expenses d
                                        WHERE d.project_id IN {set} AND {key}),
                     updated_at = ?2
                 WHERE project_id IS NULL AND EXISTS (
                     SELECT 1 FROM monthly_expenses d WHERE d.project_id IN {set} AND {key})",
                set = project_set,
                key = same_key
            ),
            params![key, now],
        )?;
        let mut folded = self.conn.execute(
            &format!(
                "DELETE FROM monthly_expenses
                 WHERE project_id IN {set} AND EXISTS (
                     SELECT 1 FROM monthly_expenses d WHERE d.project_id IS NULL AND {key})",
                set = project_set,
                key = same_key
            ),
            params![key],
        )?;

        // Between the detached rows themselves: the lowest id keeps the sum
        self.conn.execute(
            &format!(
                "UPDATE monthly_expenses
                 SET amount = (SELECT SUM(d.amount) FROM monthly_expenses d
                               WHERE d.project_id IN {set} AND {key}),
                     updated_at = ?2
                 WHERE project_id IN {set} AND NOT EXISTS (
                     SELECT 1 FROM monthly_expenses d
                     WHERE d.project_id IN {set} AND {key} AND d.id < monthly_expenses.id)",
                set = project_set,
                key = same_key
            ),
            params![key, now],
        )?;
        folded += self.conn.execute(
            &format!(
                "DELETE FROM monthly_expenses
                 WHERE project_id IN {set} AND EXISTS (
                     SELECT 1 FROM monthly_expenses d
                     WHERE d.project_id IN {set} AND {key} AND d.id < monthly_expenses.id)",
                set = project_set,
                key = same_key
            ),
            params![key],
        )?;

        self.conn.execute(
            &format!(
                "UPDATE monthly_expenses SET project_id = NULL, updated_at = ?2
                 WHERE project_id IN {}",
                project_set
            ),
            params![key, now],
        )?;
        Ok(folded)
    }

    /// Totals per month of one year; months without expenses are absent
    pub fn totals_by_month(
        &self,
        year: i32,
        asset_id: Option<AssetId>,
    ) -> EstateResult<Vec<(u32, Money)>> {
        let mut sql = String::from(
            "SELECT month, SUM(amount) FROM monthly_expenses WHERE year = ?",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(year)];
        push_filter(&mut sql, &mut params_vec, "asset_id = ?", asset_id);
        sql.push_str(" GROUP BY month ORDER BY month");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Totals per category over the months `from..=to`, largest first
    pub fn totals_by_category(
        &self,
        from: YearMonth,
        to: YearMonth,
    ) -> EstateResult<Vec<(String, Money)>> {
        let key = |m: YearMonth| i64::from(m.year()) * 100 + i64::from(m.month());
        let mut stmt = self.conn.prepare(
            "SELECT category, SUM(amount) AS total FROM monthly_expenses
             WHERE year * 100 + month BETWEEN ?1 AND ?2
             GROUP BY category
             ORDER BY total DESC, category",
        )?;
        let rows = stmt.query_map(params![key(from), key(to)], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

pub struct ImportRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ImportRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn batch_from_row(row: &Row<'_>) -> rusqlite::Result<ImportBatch> {
        Ok(ImportBatch {
            batch_id: parse_uuid(row, 0)?,
            file_name: row.get(1)?,
            inserted_count: row.get(2)?,
            updated_count: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn insert_batch(&self, batch: &ImportBatch) -> EstateResult<()> {
        self.conn.execute(
            "INSERT INTO import_batches (batch_id, file_name, inserted_count, updated_count,
                status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                batch.batch_id.to_string(),
                batch.file_name,
                batch.inserted_count,
                batch.updated_count,
                batch.status,
                batch.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn insert_record(&self, record: &ImportRecord) -> EstateResult<()> {
        self.conn.execute(
            "INSERT INTO import_records (batch_id, expense_id, action, previous_amount)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.batch_id.to_string(),
                record.expense_id,
                record.action,
                record.previous_amount,
            ],
        )?;
        Ok(())
    }

    pub fn get_batch(&self, batch_id: Uuid) -> EstateResult<Option<ImportBatch>> {
        Ok(self
            .conn
            .query_row(
                "SELECT batch_id, file_name, inserted_count, updated_count, status, created_at
                 FROM import_batches WHERE batch_id = ?1",
                params![batch_id.to_string()],
                Self::batch_from_row,
            )
            .optional()?)
    }

    /// Batches, newest first
    pub fn list_batches(&self) -> EstateResult<Vec<ImportBatch>> {
        let mut stmt = self.conn.prepare(
            "SELECT batch_id, file_name, inserted_count, updated_count, status, created_at
             FROM import_batches ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], Self::batch_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Records of a batch in the order they were written
    pub fn records(&self, batch_id: Uuid) -> EstateResult<Vec<ImportRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT batch_id, expense_id, action, previous_amount
             FROM import_records WHERE batch_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![batch_id.to_string()], |row| {
            Ok(ImportRecord {
                batch_id: parse_uuid(row, 0)?,
                expense_id: row.get(1)?,
                action: row.get(2)?,
                previous_amount: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn set_counts(&self, batch_id: Uuid, inserted: u32, updated: u32) -> EstateResult<bool> {
        let changed = self.conn.execute(
            "UPDATE import_batches SET inserted_count = ?2, updated_count = ?3 WHERE batch_id = ?1",
            params![batch_id.to_string(), inserted, updated],
        )?;
        Ok(changed > 0)
    }

    pub fn set_status(&self, batch_id: Uuid, status: ImportStatus) -> EstateResult<bool> {
        let changed = self.conn.execute(
            "UPDATE import_batches SET status = ?2 WHERE batch_id = ?1",
            params![batch_id.to_string(), status],
        )?;
        Ok(changed > 0)
    }
}

fn parse_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
