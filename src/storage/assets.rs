//! Asset repository

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::EstateResult;
use crate::models::{Asset, AssetId, AssetStatus, AssetType, Money};

use super::{push_filter, ExpenseRepository};

const COLUMNS: &str = "id, name, asset_type, status, region, address, land_area_sqm, \
    building_area_sqm, purchase_price, current_valuation, acquisition_date, notes, \
    created_at, updated_at";

/// List filters; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub region: Option<String>,
    pub asset_type: Option<AssetType>,
    pub status: Option<AssetStatus>,
}

/// Rows in other tables that reference an asset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetDependants {
    pub projects: i64,
    pub transactions: i64,
    pub quotes: i64,
    pub expenses: i64,
}

impl AssetDependants {
    pub fn total(&self) -> i64 {
        self.projects + self.transactions + self.quotes + self.expenses
    }
}

/// Portfolio-wide totals over all assets
#[derive(Debug, Clone, Default)]
pub struct AssetTotals {
    pub count: i64,
    pub total_valuation: Money,
    pub land_area_sqm: f64,
    pub building_area_sqm: f64,
}

pub struct AssetRepository<'a> {
    conn: &'a Connection,
}

impl<'a> AssetRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
        Ok(Asset {
            id: row.get(0)?,
            name: row.get(1)?,
            asset_type: row.get(2)?,
            status: row.get(3)?,
            region: row.get(4)?,
            address: row.get(5)?,
            land_area_sqm: row.get(6)?,
            building_area_sqm: row.get(7)?,
            purchase_price: row.get(8)?,
            current_valuation: row.get(9)?,
            acquisition_date: row.get(10)?,
            notes: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    /// Insert a new asset and return its row id
    pub fn insert(&self, asset: &Asset) -> EstateResult<AssetId> {
        self.conn.execute(
            "INSERT INTO assets (name, asset_type, status, region, address, land_area_sqm,
                building_area_sqm, purchase_price, current_valuation, acquisition_date, notes,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                asset.name,
                asset.asset_type,
                asset.status,
                asset.region,
                asset.address,
                asset.land_area_sqm,
                asset.building_area_sqm,
                asset.purchase_price,
                asset.current_valuation,
                asset.acquisition_date,
                asset.notes,
                asset.created_at,
                asset.updated_at,
            ],
        )?;
        Ok(AssetId::new(self.conn.last_insert_rowid()))
    }

    pub fn get(&self, id: AssetId) -> EstateResult<Option<Asset>> {
        let sql = format!("SELECT {} FROM assets WHERE id = ?1", COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::from_row)
            .optional()?)
    }

    /// Case-insensitive lookup by name
    pub fn get_by_name(&self, name: &str) -> EstateResult<Option<Asset>> {
        let sql = format!(
            "SELECT {} FROM assets WHERE LOWER(name) = LOWER(?1) ORDER BY id LIMIT 1",
            COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![name.trim()], Self::from_row)
            .optional()?)
    }

    pub fn name_exists(&self, name: &str, exclude: Option<AssetId>) -> EstateResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM assets WHERE LOWER(name) = LOWER(?1) AND id != ?2",
            params![name.trim(), exclude.map(|id| id.get()).unwrap_or(0)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Assets matching the filter, ordered by name
    pub fn list(&self, filter: &AssetFilter) -> EstateResult<Vec<Asset>> {
        let mut sql = format!("SELECT {} FROM assets WHERE 1=1", COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        push_filter(
            &mut sql,
            &mut params_vec,
            "LOWER(region) = LOWER(?)",
            filter.region.clone(),
        );
        push_filter(&mut sql, &mut params_vec, "asset_type = ?", filter.asset_type);
        push_filter(&mut sql, &mut params_vec, "status = ?", filter.status);
        sql.push_str(" ORDER BY name COLLATE NOCASE");

        debug!(%sql, "Listing assets");
        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn update(&self, asset: &Asset) -> EstateResult<bool> {
        let changed = self.conn.execute(
            "UPDATE assets SET name = ?2, asset_type = ?3, status = ?4, region = ?5,
                address = ?6, land_area_sqm = ?7, building_area_sqm = ?8, purchase_price = ?9,
                current_valuation = ?10, acquisition_date = ?11, notes = ?12, updated_at = ?13
             WHERE id = ?1",
            params![
                asset.id,
                asset.name,
                asset.asset_type,
                asset.status,
                asset.region,
                asset.address,
                asset.land_area_sqm,
                asset.building_area_sqm,
                asset.purchase_price,
                asset.current_valuation,
                asset.acquisition_date,
                asset.notes,
                asset.updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete the asset row only; fails on foreign key references
    pub fn delete(&self, id: AssetId) -> EstateResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM assets WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn dependants(&self, id: AssetId) -> EstateResult<AssetDependants> {
        let count = |table: &str| -> EstateResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {} WHERE asset_id = ?1", table);
            Ok(self.conn.query_row(&sql, params![id], |row| row.get(0))?)
        };

        Ok(AssetDependants {
            projects: count("projects")?,
            transactions: count("transactions")?,
            quotes: count("quotes")?,
            expenses: count("monthly_expenses")?,
        })
    }

    /// Delete an asset together with everything that references it.
    ///
    /// Rows attached to the asset's projects but not to the asset itself are
    /// detached from those projects. Call inside a transaction.
    pub fn delete_cascade(&self, id: AssetId) -> EstateResult<bool> {
        let project_subquery = "(SELECT id FROM projects WHERE asset_id = ?1)";

        self.conn.execute(
            &format!(
                "DELETE FROM project_tasks WHERE project_id IN {}",
                project_subquery
            ),
            params![id],
        )?;
        for table in ["transactions", "quotes", "monthly_expenses"] {
            self.conn.execute(
                &format!("DELETE FROM {} WHERE asset_id = ?1", table),
                params![id],
            )?;
        }
        for table in ["transactions", "quotes"] {
            self.conn.execute(
                &format!(
                    "UPDATE {} SET project_id = NULL WHERE project_id IN {}",
                    table, project_subquery
                ),
                params![id],
            )?;
        }
        ExpenseRepository::new(self.conn).detach_projects(project_subquery, &id)?;
        self.conn
            .execute("DELETE FROM projects WHERE asset_id = ?1", params![id])?;

        self.delete(id)
    }

    pub fn distinct_regions(&self) -> EstateResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT region FROM assets WHERE region IS NOT NULL AND region != ''
             ORDER BY region",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, _>>()?)
    }

    pub fn distinct_types(&self) -> EstateResult<Vec<AssetType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT asset_type FROM assets ORDER BY asset_type")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<AssetType>, _>>()?)
    }

    pub fn distinct_statuses(&self) -> EstateResult<Vec<AssetStatus>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT status FROM assets ORDER BY status")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<AssetStatus>, _>>()?)
    }

    pub fn totals(&self) -> EstateResult<AssetTotals> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(current_valuation), 0),
                    COALESCE(SUM(land_area_sqm), 0.0), COALESCE(SUM(building_area_sqm), 0.0)
             FROM assets",
            [],
            |row| {
                Ok(AssetTotals {
                    count: row.get(0)?,
                    total_valuation: row.get(1)?,
                    land_area_sqm: row.get(2)?,
                    building_area_sqm: row.get(3)?,
                })
            },
        )?)
    }

    pub fn count_by_status(&self) -> EstateResult<Vec<(AssetStatus, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) FROM assets GROUP BY status ORDER BY COUNT(*) DESC, status",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    fn asset(name: &str, region: &str, status: AssetStatus) -> Asset {
        let mut asset = Asset::new(name, AssetType::Warehouse);
        asset.region = Some(region.to_string());
        asset.status = status;
        asset.current_valuation = Some(Money::from_dollars(1_000_000));
        asset.land_area_sqm = Some(10_000.0);
        asset
    }

    #[test]
    fn test_insert_and_get() {
        let storage = Storage::in_memory().unwrap();
        let repo = storage.assets();
        let id = repo
            .insert(&asset("Hub", "Brisbane", AssetStatus::Operational))
            .unwrap();

        let loaded = repo.get(id).unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.name, "Hub");
        assert_eq!(loaded.region.as_deref(), Some("Brisbane"));
        assert_eq!(loaded.current_valuation, Some(Money::from_dollars(1_000_000)));
        assert!(repo.get(AssetId::new(999)).unwrap().is_none());
    }

    #[test]
    fn test_get_by_name_case_insensitive() {
        let storage = Storage::in_memory().unwrap();
        storage
            .assets()
            .insert(&asset("Brisbane Hub", "Brisbane", AssetStatus::Operational))
            .unwrap();
        assert!(storage.assets().get_by_name("brisbane hub").unwrap().is_some());
        assert!(storage.assets().name_exists("BRISBANE HUB", None).unwrap());
    }

    #[test]
    fn test_list_filters() {
        let storage = Storage::in_memory().unwrap();
        let repo = storage.assets();
        repo.insert(&asset("A", "Brisbane", AssetStatus::Operational)).unwrap();
        repo.insert(&asset("B", "Sydney", AssetStatus::Leased)).unwrap();
        repo.insert(&asset("C", "brisbane", AssetStatus::Leased)).unwrap();

        let filter = AssetFilter {
            region: Some("Brisbane".into()),
            ..Default::default()
        };
        assert_eq!(repo.list(&filter).unwrap().len(), 2);

        let filter = AssetFilter {
            region: Some("Brisbane".into()),
            status: Some(AssetStatus::Leased),
            ..Default::default()
        };
        let names: Vec<_> = repo.list(&filter).unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["C"]);
    }

    #[test]
    fn test_totals_and_status_counts() {
        let storage = Storage::in_memory().unwrap();
        let repo = storage.assets();
        repo.insert(&asset("A", "Brisbane", AssetStatus::Operational)).unwrap();
        repo.insert(&asset("B", "Sydney", AssetStatus::Operational)).unwrap();

        let totals = repo.totals().unwrap();
        assert_eq!(totals.count, 2);
        assert_eq!(totals.total_valuation, Money::from_dollars(2_000_000));
        assert_eq!(totals.land_area_sqm, 20_000.0);
        assert_eq!(totals.building_area_sqm, 0.0);
        assert_eq!(
            repo.count_by_status().unwrap(),
            vec![(AssetStatus::Operational, 2)]
        );
    }

    #[test]
    fn test_empty_totals() {
        let storage = Storage::in_memory().unwrap();
        let totals = storage.assets().totals().unwrap();
        assert_eq!(totals.count, 0);
        assert!(totals.total_valuation.is_zero());
    }
}
