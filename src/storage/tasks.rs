//! Project task repository

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::EstateResult;
use crate::models::{ProjectId, ProjectTask, TaskId};

use super::push_filter;

const COLUMNS: &str = "id, project_id, parent_task_id, code, name, description, wbs_level, \
    sort_order, start_date, finish_date, duration_days, actual_start_date, actual_finish_date, \
    predecessors, dependency_type, lag_days, completion_percentage, status, contractor, \
    estimated_cost, actual_cost, is_critical, notes, created_at, updated_at";

const ORDER: &str = " ORDER BY wbs_level, sort_order, start_date, id";

pub struct TaskRepository<'a> {
    conn: &'a Connection,
}

impl<'a> TaskRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<ProjectTask> {
        let predecessors_text: String = row.get(13)?;
        let predecessors = ProjectTask::parse_predecessors(&predecessors_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(13, Type::Text, e.to_string().into())
        })?;

        Ok(ProjectTask {
            id: row.get(0)?,
            project_id: row.get(1)?,
            parent_task_id: row.get(2)?,
            code: row.get(3)?,
            name: row.get(4)?,
            description: row.get(5)?,
            wbs_level: row.get(6)?,
            sort_order: row.get(7)?,
            start_date: row.get(8)?,
            finish_date: row.get(9)?,
            duration_days: row.get(10)?,
            actual_start_date: row.get(11)?,
            actual_finish_date: row.get(12)?,
            predecessors,
            dependency_type: row.get(14)?,
            lag_days: row.get(15)?,
            completion_percentage: row.get(16)?,
            status: row.get(17)?,
            contractor: row.get(18)?,
            estimated_cost: row.get(19)?,
            actual_cost: row.get(20)?,
            is_critical: row.get(21)?,
            notes: row.get(22)?,
            created_at: row.get(23)?,
            updated_at: row.get(24)?,
        })
    }

    pub fn insert(&self, task: &ProjectTask) -> EstateResult<TaskId> {
        self.conn.execute(
            "INSERT INTO project_tasks (project_id, parent_task_id, code, name, description,
                wbs_level, sort_order, start_date, finish_date, duration_days, actual_start_date,
                actual_finish_date, predecessors, dependency_type, lag_days,
                completion_percentage, status, contractor, estimated_cost, actual_cost,
                is_critical, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
            params![
                task.project_id,
                task.parent_task_id,
                task.code,
                task.name,
                task.description,
                task.wbs_level,
                task.sort_order,
                task.start_date,
                task.finish_date,
                task.duration_days,
                task.actual_start_date,
                task.actual_finish_date,
                task.predecessors_to_text(),
                task.dependency_type,
                task.lag_days,
                task.completion_percentage,
                task.status,
                task.contractor,
                task.estimated_cost,
                task.actual_cost,
                task.is_critical,
                task.notes,
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(TaskId::new(self.conn.last_insert_rowid()))
    }

    pub fn get(&self, id: TaskId) -> EstateResult<Option<ProjectTask>> {
        let sql = format!("SELECT {} FROM project_tasks WHERE id = ?1", COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::from_row)
            .optional()?)
    }

    /// Tasks of a project ordered by (wbs_level, sort_order, start_date)
    pub fn list(&self, project_id: ProjectId, wbs_level: Option<u32>) -> EstateResult<Vec<ProjectTask>> {
        let mut sql = format!(
            "SELECT {} FROM project_tasks WHERE project_id = ?",
            COLUMNS
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(project_id)];
        push_filter(&mut sql, &mut params_vec, "wbs_level = ?", wbs_level);
        sql.push_str(ORDER);

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every task of every project, grouped by project
    pub fn all(&self) -> EstateResult<Vec<ProjectTask>> {
        let sql = format!(
            "SELECT {} FROM project_tasks ORDER BY project_id, wbs_level, sort_order, start_date, id",
            COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn critical(&self, project_id: ProjectId) -> EstateResult<Vec<ProjectTask>> {
        let sql = format!(
            "SELECT {} FROM project_tasks WHERE project_id = ?1 AND is_critical = 1{}",
            COLUMNS, ORDER
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![project_id], Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn update(&self, task: &ProjectTask) -> EstateResult<bool> {
        let changed = self.conn.execute(
            "UPDATE project_tasks SET parent_task_id = ?2, code = ?3, name = ?4,
                description = ?5, wbs_level = ?6, sort_order = ?7, start_date = ?8,
                finish_date = ?9, duration_days = ?10, actual_start_date = ?11,
                actual_finish_date = ?12, predecessors = ?13, dependency_type = ?14,
                lag_days = ?15, completion_percentage = ?16, status = ?17, contractor = ?18,
                estimated_cost = ?19, actual_cost = ?20, is_critical = ?21, notes = ?22,
                updated_at = ?23
             WHERE id = ?1",
            params![
                task.id,
                task.parent_task_id,
                task.code,
                task.name,
                task.description,
                task.wbs_level,
                task.sort_order,
                task.start_date,
                task.finish_date,
                task.duration_days,
                task.actual_start_date,
                task.actual_finish_date,
                task.predecessors_to_text(),
                task.dependency_type,
                task.lag_days,
                task.completion_percentage,
                task.status,
                task.contractor,
                task.estimated_cost,
                task.actual_cost,
                task.is_critical,
                task.notes,
                task.updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Move the children of `id` under `new_parent`
    pub fn reparent_children(&self, id: TaskId, new_parent: Option<TaskId>) -> EstateResult<usize> {
        Ok(self.conn.execute(
            "UPDATE project_tasks SET parent_task_id = ?2 WHERE parent_task_id = ?1",
            params![id, new_parent],
        )?)
    }

    /// Recompute `wbs_level` for every task of a project from the parent
    /// chain: top-level tasks are level 1, each child one below its parent.
    pub fn refresh_levels(&self, project_id: ProjectId) -> EstateResult<usize> {
        let changed = self.conn.execute(
            "WITH RECURSIVE tree(id, level) AS (
                 SELECT id, 1 FROM project_tasks
                 WHERE project_id = ?1 AND parent_task_id IS NULL
                 UNION ALL
                 SELECT t.id, tree.level + 1 FROM project_tasks t
                 JOIN tree ON t.parent_task_id = tree.id
             )
             UPDATE project_tasks
             SET wbs_level = (SELECT level FROM tree WHERE tree.id = project_tasks.id)
             WHERE project_id = ?1 AND id IN (SELECT id FROM tree)
               AND wbs_level != (SELECT level FROM tree WHERE tree.id = project_tasks.id)",
            params![project_id],
        )?;
        debug!(project = %project_id, changed, "Refreshed WBS levels");
        Ok(changed)
    }

    pub fn delete(&self, id: TaskId) -> EstateResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM project_tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Project};
    use crate::storage::Storage;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (Storage, ProjectId) {
        let storage = Storage::in_memory().unwrap();
        let project_id = storage.projects().insert(&Project::new("Stage 1")).unwrap();
        (storage, project_id)
    }

    #[test]
    fn test_round_trip_with_predecessors() {
        let (storage, project_id) = setup();
        let mut task = ProjectTask::new(project_id, "Slab", date(2025, 3, 1), date(2025, 3, 20));
        task.predecessors = vec![TaskId::new(1), TaskId::new(2)];
        task.estimated_cost = Some(Money::from_dollars(50_000));
        let id = storage.tasks().insert(&task).unwrap();

        let loaded = storage.tasks().get(id).unwrap().unwrap();
        assert_eq!(loaded.predecessors, vec![TaskId::new(1), TaskId::new(2)]);
        assert_eq!(loaded.estimated_cost, Some(Money::from_dollars(50_000)));
        assert_eq!(loaded.duration_days, 19);
    }

    #[test]
    fn test_list_order() {
        let (storage, project_id) = setup();
        let repo = storage.tasks();
        let mut late = ProjectTask::new(project_id, "Late", date(2025, 5, 1), date(2025, 5, 2));
        late.sort_order = 1;
        repo.insert(&late).unwrap();
        let mut child = ProjectTask::new(project_id, "Child", date(2025, 1, 1), date(2025, 1, 2));
        child.wbs_level = 2;
        repo.insert(&child).unwrap();
        repo.insert(&ProjectTask::new(project_id, "Early", date(2025, 4, 1), date(2025, 4, 2)))
            .unwrap();

        let names: Vec<_> = repo
            .list(project_id, None)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Early", "Late", "Child"]);
        assert_eq!(repo.list(project_id, Some(2)).unwrap().len(), 1);
    }

    #[test]
    fn test_finish_before_start_rejected_by_schema() {
        let (storage, project_id) = setup();
        let mut task = ProjectTask::new(project_id, "Bad", date(2025, 3, 1), date(2025, 3, 2));
        task.finish_date = date(2025, 2, 1);
        assert!(storage.tasks().insert(&task).unwrap_err().is_integrity());
    }

    #[test]
    fn test_reparent_children() {
        let (storage, project_id) = setup();
        let repo = storage.tasks();
        let root = repo
            .insert(&ProjectTask::new(project_id, "Root", date(2025, 1, 1), date(2025, 2, 1)))
            .unwrap();
        let mut mid = ProjectTask::new(project_id, "Mid", date(2025, 1, 1), date(2025, 2, 1));
        mid.parent_task_id = Some(root);
        let mid = repo.insert(&mid).unwrap();
        let mut leaf = ProjectTask::new(project_id, "Leaf", date(2025, 1, 1), date(2025, 2, 1));
        leaf.parent_task_id = Some(mid);
        let leaf = repo.insert(&leaf).unwrap();

        assert_eq!(repo.reparent_children(mid, Some(root)).unwrap(), 1);
        repo.delete(mid).unwrap();
        assert_eq!(repo.get(leaf).unwrap().unwrap().parent_task_id, Some(root));
    }
}
