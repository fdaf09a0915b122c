//! Quote repository

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::EstateResult;
use crate::models::{ConsultantId, Money, ProjectId, Quote, QuoteId, QuoteStatus};

use super::push_filter;

const COLUMNS: &str = "id, consultant_id, asset_id, project_id, quote_date, valid_until, amount, \
    currency, status, scope, project_type, project_size, actual_amount, notes, created_at, \
    updated_at";

/// A quote joined with the names it refers to
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteHistoryRow {
    pub quote_id: QuoteId,
    pub quote_date: NaiveDate,
    pub consultant_name: String,
    pub company: Option<String>,
    pub project_name: Option<String>,
    pub scope: Option<String>,
    pub amount: Money,
    pub actual_amount: Option<Money>,
    pub status: QuoteStatus,
}

pub struct QuoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> QuoteRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Quote> {
        Ok(Quote {
            id: row.get(0)?,
            consultant_id: row.get(1)?,
            asset_id: row.get(2)?,
            project_id: row.get(3)?,
            quote_date: row.get(4)?,
            valid_until: row.get(5)?,
            amount: row.get(6)?,
            currency: row.get(7)?,
            status: row.get(8)?,
            scope: row.get(9)?,
            project_type: row.get(10)?,
            project_size: row.get(11)?,
            actual_amount: row.get(12)?,
            notes: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    pub fn insert(&self, quote: &Quote) -> EstateResult<QuoteId> {
        self.conn.execute(
            "INSERT INTO quotes (consultant_id, asset_id, project_id, quote_date, valid_until,
                amount, currency, status, scope, project_type, project_size, actual_amount,
                notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                quote.consultant_id,
                quote.asset_id,
                quote.project_id,
                quote.quote_date,
                quote.valid_until,
                quote.amount,
                quote.currency,
                quote.status,
                quote.scope,
                quote.project_type,
                quote.project_size,
                quote.actual_amount,
                quote.notes,
                quote.created_at,
                quote.updated_at,
            ],
        )?;
        Ok(QuoteId::new(self.conn.last_insert_rowid()))
    }

    pub fn get(&self, id: QuoteId) -> EstateResult<Option<Quote>> {
        let sql = format!("SELECT {} FROM quotes WHERE id = ?1", COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::from_row)
            .optional()?)
    }

    pub fn all(&self) -> EstateResult<Vec<Quote>> {
        let sql = format!("SELECT {} FROM quotes ORDER BY id", COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// All quotes from one consultant, newest first
    pub fn list_for_consultant(&self, consultant_id: ConsultantId) -> EstateResult<Vec<Quote>> {
        let sql = format!(
            "SELECT {} FROM quotes WHERE consultant_id = ?1 ORDER BY quote_date DESC, id DESC",
            COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![consultant_id], Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Quotes joined with consultant and project names, newest first
    pub fn history(
        &self,
        project_id: Option<ProjectId>,
        consultant_id: Option<ConsultantId>,
    ) -> EstateResult<Vec<QuoteHistoryRow>> {
        let mut sql = String::from(
            "SELECT q.id, q.quote_date, c.name, c.company, p.name, q.scope, q.amount,
                    q.actual_amount, q.status
             FROM quotes q
             JOIN consultants c ON c.id = q.consultant_id
             LEFT JOIN projects p ON p.id = q.project_id
             WHERE 1=1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];
        push_filter(&mut sql, &mut params_vec, "q.project_id = ?", project_id);
        push_filter(&mut sql, &mut params_vec, "q.consultant_id = ?", consultant_id);
        sql.push_str(" ORDER BY q.quote_date DESC, q.id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok(QuoteHistoryRow {
                quote_id: row.get(0)?,
                quote_date: row.get(1)?,
                consultant_name: row.get(2)?,
                company: row.get(3)?,
                project_name: row.get(4)?,
                scope: row.get(5)?,
                amount: row.get(6)?,
                actual_amount: row.get(7)?,
                status: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// (project_size, amount) pairs for a consultant's sized quotes,
    /// optionally limited to one project type
    pub fn size_amount_points(
        &self,
        consultant_id: ConsultantId,
        project_type: Option<&str>,
    ) -> EstateResult<Vec<(f64, Money)>> {
        let mut sql = String::from(
            "SELECT project_size, amount FROM quotes
             WHERE consultant_id = ? AND project_size IS NOT NULL AND project_size > 0",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(consultant_id)];
        push_filter(
            &mut sql,
            &mut params_vec,
            "LOWER(project_type) = LOWER(?)",
            project_type.map(str::to_string),
        );
        sql.push_str(" ORDER BY project_size");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn set_status(
        &self,
        id: QuoteId,
        status: QuoteStatus,
        actual_amount: Option<Money>,
    ) -> EstateResult<bool> {
        let changed = self.conn.execute(
            "UPDATE quotes SET status = ?2, actual_amount = COALESCE(?3, actual_amount),
                updated_at = ?4
             WHERE id = ?1",
            params![id, status, actual_amount, chrono::Utc::now()],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: QuoteId) -> EstateResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM quotes WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Consultant, Project};
    use crate::storage::Storage;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_history_joins_names() {
        let storage = Storage::in_memory().unwrap();
        let mut consultant = Consultant::new("Jane Smith");
        consultant.company = Some("Smith Engineering".into());
        let consultant_id = storage.consultants().insert(&consultant).unwrap();
        let project_id = storage.projects().insert(&Project::new("Stage 1")).unwrap();

        let mut older = Quote::new(consultant_id, date(2025, 1, 1), Money::from_dollars(100));
        older.project_id = Some(project_id);
        storage.quotes().insert(&older).unwrap();
        let newer = Quote::new(consultant_id, date(2025, 2, 1), Money::from_dollars(200));
        storage.quotes().insert(&newer).unwrap();

        let rows = storage.quotes().history(None, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quote_date, date(2025, 2, 1));
        assert_eq!(rows[1].project_name.as_deref(), Some("Stage 1"));
        assert_eq!(rows[1].company.as_deref(), Some("Smith Engineering"));

        let rows = storage.quotes().history(Some(project_id), None).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_set_status_keeps_actual_when_absent() {
        let storage = Storage::in_memory().unwrap();
        let consultant_id = storage.consultants().insert(&Consultant::new("A")).unwrap();
        let id = storage
            .quotes()
            .insert(&Quote::new(consultant_id, date(2025, 1, 1), Money::from_dollars(100)))
            .unwrap();

        storage
            .quotes()
            .set_status(id, QuoteStatus::Completed, Some(Money::from_dollars(95)))
            .unwrap();
        storage
            .quotes()
            .set_status(id, QuoteStatus::Completed, None)
            .unwrap();

        let quote = storage.quotes().get(id).unwrap().unwrap();
        assert_eq!(quote.status, QuoteStatus::Completed);
        assert_eq!(quote.actual_amount, Some(Money::from_dollars(95)));
    }

    #[test]
    fn test_quote_requires_consultant() {
        let storage = Storage::in_memory().unwrap();
        let quote = Quote::new(ConsultantId::new(42), date(2025, 1, 1), Money::from_dollars(1));
        assert!(storage.quotes().insert(&quote).unwrap_err().is_integrity());
    }
}
