//! Project repository

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::EstateResult;
use crate::models::{AssetId, Money, Project, ProjectId, ProjectStatus};

use super::{push_filter, ExpenseRepository};

const COLUMNS: &str = "id, asset_id, name, code, project_type, status, budget, actual_cost, \
    contingency, completion_percentage, start_date, expected_completion, actual_start_date, \
    actual_completion_date, description, is_active, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub asset_id: Option<AssetId>,
    pub status: Option<ProjectStatus>,
    pub active_only: bool,
}

/// Costs recorded against a project in other tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectCostSources {
    /// Expense transactions tagged to the project
    pub transactions: Money,
    pub monthly_expenses: Money,
    /// Accepted and completed quotes
    pub committed_quotes: Money,
    pub task_estimated: Money,
    pub task_actual: Money,
}

pub struct ProjectRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ProjectRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
        Ok(Project {
            id: row.get(0)?,
            asset_id: row.get(1)?,
            name: row.get(2)?,
            code: row.get(3)?,
            project_type: row.get(4)?,
            status: row.get(5)?,
            budget: row.get(6)?,
            actual_cost: row.get(7)?,
            contingency: row.get(8)?,
            completion_percentage: row.get(9)?,
            start_date: row.get(10)?,
            expected_completion: row.get(11)?,
            actual_start_date: row.get(12)?,
            actual_completion_date: row.get(13)?,
            description: row.get(14)?,
            is_active: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
        })
    }

    pub fn insert(&self, project: &Project) -> EstateResult<ProjectId> {
        self.conn.execute(
            "INSERT INTO projects (asset_id, name, code, project_type, status, budget,
                actual_cost, contingency, completion_percentage, start_date, expected_completion,
                actual_start_date, actual_completion_date, description, is_active, created_at,
                updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                project.asset_id,
                project.name,
                project.code,
                project.project_type,
                project.status,
                project.budget,
                project.actual_cost,
                project.contingency,
                project.completion_percentage,
                project.start_date,
                project.expected_completion,
                project.actual_start_date,
                project.actual_completion_date,
                project.description,
                project.is_active,
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(ProjectId::new(self.conn.last_insert_rowid()))
    }

    pub fn get(&self, id: ProjectId) -> EstateResult<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::from_row)
            .optional()?)
    }

    /// Case-insensitive lookup by name or project code
    pub fn get_by_name(&self, name: &str) -> EstateResult<Option<Project>> {
        let sql = format!(
            "SELECT {} FROM projects
             WHERE LOWER(name) = LOWER(?1) OR LOWER(code) = LOWER(?1)
             ORDER BY id LIMIT 1",
            COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![name.trim()], Self::from_row)
            .optional()?)
    }

    pub fn list(&self, filter: &ProjectFilter) -> EstateResult<Vec<Project>> {
        let mut sql = format!("SELECT {} FROM projects WHERE 1=1", COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        push_filter(&mut sql, &mut params_vec, "asset_id = ?", filter.asset_id);
        push_filter(&mut sql, &mut params_vec, "status = ?", filter.status);
        if filter.active_only {
            sql.push_str(" AND is_active = 1");
        }
        sql.push_str(" ORDER BY COALESCE(start_date, '9999-12-31'), name");

        debug!(%sql, "Listing projects");
        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn update(&self, project: &Project) -> EstateResult<bool> {
        let changed = self.conn.execute(
            "UPDATE projects SET asset_id = ?2, name = ?3, code = ?4, project_type = ?5,
                status = ?6, budget = ?7, actual_cost = ?8, contingency = ?9,
                completion_percentage = ?10, start_date = ?11, expected_completion = ?12,
                actual_start_date = ?13, actual_completion_date = ?14, description = ?15,
                is_active = ?16, updated_at = ?17
             WHERE id = ?1",
            params![
                project.id,
                project.asset_id,
                project.name,
                project.code,
                project.project_type,
                project.status,
                project.budget,
                project.actual_cost,
                project.contingency,
                project.completion_percentage,
                project.start_date,
                project.expected_completion,
                project.actual_start_date,
                project.actual_completion_date,
                project.description,
                project.is_active,
                project.updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete a project, removing its tasks and detaching everything else
    /// that references it. Call inside a transaction.
    pub fn delete_detaching(&self, id: ProjectId) -> EstateResult<bool> {
        self.conn
            .execute("DELETE FROM project_tasks WHERE project_id = ?1", params![id])?;
        for table in ["transactions", "quotes"] {
            self.conn.execute(
                &format!("UPDATE {} SET project_id = NULL WHERE project_id = ?1", table),
                params![id],
            )?;
        }
        ExpenseRepository::new(self.conn).detach_projects("(?1)", &id)?;
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Number of projects in an active status
    pub fn active_count(&self) -> EstateResult<i64> {
        let statuses = ProjectStatus::ACTIVE;
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "SELECT COUNT(*) FROM projects WHERE status IN ({})",
            placeholders
        );
        let params_refs: Vec<&dyn rusqlite::ToSql> = statuses
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        Ok(self
            .conn
            .query_row(&sql, params_refs.as_slice(), |row| row.get(0))?)
    }

    pub fn total_budget(&self) -> EstateResult<Money> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(budget), 0) FROM projects",
            [],
            |row| row.get(0),
        )?)
    }

    pub fn total_actual_cost(&self) -> EstateResult<Money> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(actual_cost), 0) FROM projects",
            [],
            |row| row.get(0),
        )?)
    }

    /// Mean reported completion; 0 with no projects
    pub fn average_completion(&self) -> EstateResult<f64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(AVG(completion_percentage), 0.0) FROM projects",
            [],
            |row| row.get(0),
        )?)
    }

    pub fn cost_sources(&self, id: ProjectId) -> EstateResult<ProjectCostSources> {
        let sum = |sql: &str| -> EstateResult<Money> {
            Ok(self.conn.query_row(sql, params![id], |row| row.get(0))?)
        };

        Ok(ProjectCostSources {
            transactions: sum(
                "SELECT COALESCE(SUM(amount), 0) FROM transactions
                 WHERE project_id = ?1 AND kind = 'expense'",
            )?,
            monthly_expenses: sum(
                "SELECT COALESCE(SUM(amount), 0) FROM monthly_expenses WHERE project_id = ?1",
            )?,
            committed_quotes: sum(
                "SELECT COALESCE(SUM(amount), 0) FROM quotes
                 WHERE project_id = ?1 AND status IN ('accepted', 'completed')",
            )?,
            task_estimated: sum(
                "SELECT COALESCE(SUM(estimated_cost), 0) FROM project_tasks WHERE project_id = ?1",
            )?,
            task_actual: sum(
                "SELECT COALESCE(SUM(actual_cost), 0) FROM project_tasks WHERE project_id = ?1",
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Asset, AssetType};
    use crate::storage::Storage;

    fn project(name: &str, status: ProjectStatus, budget: i64, completion: f64) -> Project {
        let mut project = Project::new(name);
        project.status = status;
        project.budget = Money::from_dollars(budget);
        project.completion_percentage = completion;
        project
    }

    #[test]
    fn test_insert_and_get_by_code() {
        let storage = Storage::in_memory().unwrap();
        let mut p = project("Stage 1", ProjectStatus::Planning, 100, 0.0);
        p.code = Some("SC-01".into());
        let id = storage.projects().insert(&p).unwrap();

        let by_code = storage.projects().get_by_name("sc-01").unwrap().unwrap();
        assert_eq!(by_code.id, id);
        assert_eq!(by_code.budget, Money::from_dollars(100));
    }

    #[test]
    fn test_aggregates() {
        let storage = Storage::in_memory().unwrap();
        let repo = storage.projects();
        repo.insert(&project("A", ProjectStatus::Planning, 100, 10.0)).unwrap();
        repo.insert(&project("B", ProjectStatus::Construction, 200, 50.0)).unwrap();
        repo.insert(&project("C", ProjectStatus::Completed, 300, 90.0)).unwrap();

        assert_eq!(repo.active_count().unwrap(), 2);
        assert_eq!(repo.total_budget().unwrap(), Money::from_dollars(600));
        assert_eq!(repo.average_completion().unwrap(), 50.0);
    }

    #[test]
    fn test_empty_aggregates() {
        let storage = Storage::in_memory().unwrap();
        assert_eq!(storage.projects().active_count().unwrap(), 0);
        assert!(storage.projects().total_budget().unwrap().is_zero());
        assert_eq!(storage.projects().average_completion().unwrap(), 0.0);
    }

    #[test]
    fn test_list_by_asset() {
        let storage = Storage::in_memory().unwrap();
        let asset_id = storage
            .assets()
            .insert(&Asset::new("Hub", AssetType::Warehouse))
            .unwrap();
        let mut attached = project("Attached", ProjectStatus::Planning, 1, 0.0);
        attached.asset_id = Some(asset_id);
        storage.projects().insert(&attached).unwrap();
        storage
            .projects()
            .insert(&project("Loose", ProjectStatus::Planning, 1, 0.0))
            .unwrap();

        let filter = ProjectFilter {
            asset_id: Some(asset_id),
            ..Default::default()
        };
        let listed = storage.projects().list(&filter).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Attached");
    }
}
