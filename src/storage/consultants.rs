//! Consultant repository

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::EstateResult;
use crate::models::{Consultant, ConsultantId};

use super::push_filter;

const COLUMNS: &str = "id, name, company, email, phone, category, typical_scopes, \
    quality_rating, reliability_rating, cost_rating, notes, is_active, created_at, updated_at";

pub struct ConsultantRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ConsultantRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Consultant> {
        let scopes_json: String = row.get(6)?;
        let typical_scopes = serde_json::from_str(&scopes_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

        Ok(Consultant {
            id: row.get(0)?,
            name: row.get(1)?,
            company: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            category: row.get(5)?,
            typical_scopes,
            quality_rating: row.get(7)?,
            reliability_rating: row.get(8)?,
            cost_rating: row.get(9)?,
            notes: row.get(10)?,
            is_active: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    pub fn insert(&self, consultant: &Consultant) -> EstateResult<ConsultantId> {
        let scopes = serde_json::to_string(&consultant.typical_scopes)?;
        self.conn.execute(
            "INSERT INTO consultants (name, company, email, phone, category, typical_scopes,
                quality_rating, reliability_rating, cost_rating, notes, is_active, created_at,
                updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                consultant.name,
                consultant.company,
                consultant.email,
                consultant.phone,
                consultant.category,
                scopes,
                consultant.quality_rating,
                consultant.reliability_rating,
                consultant.cost_rating,
                consultant.notes,
                consultant.is_active,
                consultant.created_at,
                consultant.updated_at,
            ],
        )?;
        Ok(ConsultantId::new(self.conn.last_insert_rowid()))
    }

    pub fn get(&self, id: ConsultantId) -> EstateResult<Option<Consultant>> {
        let sql = format!("SELECT {} FROM consultants WHERE id = ?1", COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::from_row)
            .optional()?)
    }

    /// Case-insensitive lookup by consultant or company name
    pub fn get_by_name(&self, name: &str) -> EstateResult<Option<Consultant>> {
        let sql = format!(
            "SELECT {} FROM consultants
             WHERE LOWER(name) = LOWER(?1) OR LOWER(company) = LOWER(?1)
             ORDER BY is_active DESC, id LIMIT 1",
            COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![name.trim()], Self::from_row)
            .optional()?)
    }

    /// Consultants ordered by name, optionally one category and active only
    pub fn list(&self, category: Option<&str>, active_only: bool) -> EstateResult<Vec<Consultant>> {
        let mut sql = format!("SELECT {} FROM consultants WHERE 1=1", COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        push_filter(
            &mut sql,
            &mut params_vec,
            "LOWER(category) = LOWER(?)",
            category.map(str::to_string),
        );
        if active_only {
            sql.push_str(" AND is_active = 1");
        }
        sql.push_str(" ORDER BY name COLLATE NOCASE");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn update(&self, consultant: &Consultant) -> EstateResult<bool> {
        let scopes = serde_json::to_string(&consultant.typical_scopes)?;
        let changed = self.conn.execute(
            "UPDATE consultants SET name = ?2, company = ?3, email = ?4, phone = ?5,
                category = ?6, typical_scopes = ?7, quality_rating = ?8,
                reliability_rating = ?9, cost_rating = ?10, notes = ?11, is_active = ?12,
                updated_at = ?13
             WHERE id = ?1",
            params![
                consultant.id,
                consultant.name,
                consultant.company,
                consultant.email,
                consultant.phone,
                consultant.category,
                scopes,
                consultant.quality_rating,
                consultant.reliability_rating,
                consultant.cost_rating,
                consultant.notes,
                consultant.is_active,
                consultant.updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Set the active flag; consultants are never hard-deleted
    pub fn set_active(&self, id: ConsultantId, active: bool) -> EstateResult<bool> {
        let changed = self.conn.execute(
            "UPDATE consultants SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, active, chrono::Utc::now()],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[test]
    fn test_round_trip_with_scopes() {
        let storage = Storage::in_memory().unwrap();
        let mut consultant = Consultant::new("Jane Smith");
        consultant.category = Some("Civil Engineering".into());
        consultant.typical_scopes = vec!["Stormwater design".into(), "Pavement".into()];
        consultant.quality_rating = Some(4);
        let id = storage.consultants().insert(&consultant).unwrap();

        let loaded = storage.consultants().get(id).unwrap().unwrap();
        assert_eq!(loaded.typical_scopes, consultant.typical_scopes);
        assert_eq!(loaded.quality_rating, Some(4));
        assert!(loaded.cost_rating.is_none());
    }

    #[test]
    fn test_list_active_and_category() {
        let storage = Storage::in_memory().unwrap();
        let repo = storage.consultants();
        let mut a = Consultant::new("A");
        a.category = Some("Planning".into());
        let a_id = repo.insert(&a).unwrap();
        let mut b = Consultant::new("B");
        b.category = Some("Surveying".into());
        repo.insert(&b).unwrap();

        repo.set_active(a_id, false).unwrap();
        assert_eq!(repo.list(None, true).unwrap().len(), 1);
        assert_eq!(repo.list(None, false).unwrap().len(), 2);
        assert_eq!(repo.list(Some("planning"), false).unwrap().len(), 1);
    }

    #[test]
    fn test_rating_check_constraint() {
        let storage = Storage::in_memory().unwrap();
        let mut consultant = Consultant::new("A");
        consultant.cost_rating = Some(9);
        assert!(storage.consultants().insert(&consultant).unwrap_err().is_integrity());
    }
}
