//! Project task (WBS) service
//!
//! Tasks form a tree per project through `parent_task_id`. The service keeps
//! that tree well-formed: parents live in the same project, no task is its
//! own ancestor, and deleting a task hands its children to its parent.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{EstateError, EstateResult};
use crate::models::{ProjectId, ProjectTask, TaskId};
use crate::storage::{Storage, TaskRepository};

pub struct TaskService<'a> {
    storage: &'a Storage,
}

/// A task with its subtasks
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub task: ProjectTask,
    pub children: Vec<TaskNode>,
}

impl TaskNode {
    /// Number of tasks in this subtree, including this one
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TaskNode::size).sum::<usize>()
    }
}

/// Schedule figures for one project
#[derive(Debug, Clone, Default)]
pub struct ScheduleSummary {
    pub task_count: usize,
    pub earliest_start: Option<NaiveDate>,
    pub latest_finish: Option<NaiveDate>,
    /// Calendar days from earliest start to latest finish
    pub total_duration_days: i64,
    /// Completion of leaf tasks weighted by their duration
    pub weighted_completion: f64,
    pub overdue: Vec<ProjectTask>,
}

impl<'a> TaskService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn add(&self, mut task: ProjectTask) -> EstateResult<ProjectTask> {
        task.name = task.name.trim().to_string();
        task.validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;

        if self.storage.projects().get(task.project_id)?.is_none() {
            return Err(EstateError::project_not_found(task.project_id.to_string()));
        }
        self.check_links(&task)?;
        if let Some(parent_id) = task.parent_task_id {
            let parent = self.require_task(parent_id)?;
            task.wbs_level = parent.wbs_level + 1;
        }

        task.id = self.storage.tasks().insert(&task)?;
        info!(id = %task.id, project = %task.project_id, name = %task.name, "Created task");

        self.storage.log_create(
            EntityType::ProjectTask,
            task.id.to_string(),
            Some(task.name.clone()),
            &task,
        )?;

        Ok(task)
    }

    pub fn get(&self, id: TaskId) -> EstateResult<Option<ProjectTask>> {
        self.storage.tasks().get(id)
    }

    fn require_task(&self, id: TaskId) -> EstateResult<ProjectTask> {
        self.get(id)?
            .ok_or_else(|| EstateError::task_not_found(id.to_string()))
    }

    /// Find a task by ID string, or by code within `project_id`
    pub fn require(&self, identifier: &str, project_id: Option<ProjectId>) -> EstateResult<ProjectTask> {
        if let Ok(id) = identifier.parse::<TaskId>() {
            if let Some(task) = self.get(id)? {
                return Ok(task);
            }
        }

        if let Some(project_id) = project_id {
            let found = self
                .list(project_id, None)?
                .into_iter()
                .find(|t| {
                    t.code
                        .as_deref()
                        .is_some_and(|code| code.eq_ignore_ascii_case(identifier))
                });
            if let Some(task) = found {
                return Ok(task);
            }
        }

        Err(EstateError::task_not_found(identifier))
    }

    /// Tasks of a project in (wbs_level, sort_order, start_date) order
    pub fn list(&self, project_id: ProjectId, wbs_level: Option<u32>) -> EstateResult<Vec<ProjectTask>> {
        debug!(project = %project_id, ?wbs_level, "Listing tasks");
        self.storage.tasks().list(project_id, wbs_level)
    }

    pub fn critical_tasks(&self, project_id: ProjectId) -> EstateResult<Vec<ProjectTask>> {
        self.storage.tasks().critical(project_id)
    }

    pub fn update(&self, mut task: ProjectTask) -> EstateResult<ProjectTask> {
        let before = self.require_task(task.id)?;
        if before.project_id != task.project_id {
            return Err(EstateError::Validation(
                "A task cannot be moved to another project".into(),
            ));
        }

        task.name = task.name.trim().to_string();
        task.validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;
        self.check_links(&task)?;
        self.check_no_cycle(&task)?;

        let moved = task.parent_task_id != before.parent_task_id;
        if moved {
            task.wbs_level = match task.parent_task_id {
                Some(parent_id) => self.require_task(parent_id)?.wbs_level + 1,
                None => 1,
            };
        }

        task.updated_at = Utc::now();
        self.storage.transaction(|conn| {
            let repo = TaskRepository::new(conn);
            repo.update(&task)?;
            if moved {
                repo.refresh_levels(task.project_id)?;
            }
            Ok(())
        })?;

        self.storage.log_update(
            EntityType::ProjectTask,
            task.id.to_string(),
            Some(task.name.clone()),
            &before,
            &task,
        )?;

        Ok(task)
    }

    /// Delete a task. Its children move up to its parent and it is removed
    /// from other tasks' predecessor lists.
    pub fn delete(&self, id: TaskId) -> EstateResult<ProjectTask> {
        let task = self.require_task(id)?;

        self.storage.transaction(|conn| {
            let repo = TaskRepository::new(conn);
            repo.reparent_children(id, task.parent_task_id)?;
            for mut other in repo.list(task.project_id, None)? {
                if other.predecessors.contains(&id) {
                    other.predecessors.retain(|p| *p != id);
                    repo.update(&other)?;
                }
            }
            repo.delete(id)?;
            repo.refresh_levels(task.project_id)
        })?;
        info!(id = %id, name = %task.name, "Deleted task");

        self.storage.log_delete(
            EntityType::ProjectTask,
            id.to_string(),
            Some(task.name.clone()),
            &task,
        )?;

        Ok(task)
    }

    /// The project's tasks as a forest rooted at tasks without a parent
    pub fn hierarchy(&self, project_id: ProjectId) -> EstateResult<Vec<TaskNode>> {
        let tasks = self.list(project_id, None)?;
        let known: HashSet<TaskId> = tasks.iter().map(|t| t.id).collect();

        let mut children: HashMap<TaskId, Vec<ProjectTask>> = HashMap::new();
        let mut roots = Vec::new();
        for task in tasks {
            match task.parent_task_id {
                Some(parent) if known.contains(&parent) => {
                    children.entry(parent).or_default().push(task)
                }
                _ => roots.push(task),
            }
        }

        Ok(roots
            .into_iter()
            .map(|task| build_node(task, &mut children))
            .collect())
    }

    pub fn schedule_summary(&self, project_id: ProjectId, today: NaiveDate) -> EstateResult<ScheduleSummary> {
        let tasks = self.list(project_id, None)?;
        if tasks.is_empty() {
            return Ok(ScheduleSummary::default());
        }

        let earliest_start = tasks.iter().map(|t| t.start_date).min();
        let latest_finish = tasks.iter().map(|t| t.finish_date).max();
        let total_duration_days = match (earliest_start, latest_finish) {
            (Some(start), Some(finish)) => (finish - start).num_days(),
            _ => 0,
        };

        let parents: HashSet<TaskId> = tasks.iter().filter_map(|t| t.parent_task_id).collect();
        let leaves: Vec<&ProjectTask> = tasks.iter().filter(|t| !parents.contains(&t.id)).collect();
        let weighted_completion = weighted_completion(&leaves);

        let overdue = tasks
            .iter()
            .filter(|t| t.is_overdue(today))
            .cloned()
            .collect();

        Ok(ScheduleSummary {
            task_count: tasks.len(),
            earliest_start,
            latest_finish,
            total_duration_days,
            weighted_completion,
            overdue,
        })
    }

    /// Parent and predecessors must exist in the same project
    fn check_links(&self, task: &ProjectTask) -> EstateResult<()> {
        if let Some(parent_id) = task.parent_task_id {
            let parent = self.require_task(parent_id)?;
            if parent.project_id != task.project_id {
                return Err(EstateError::Validation(format!(
                    "Parent task {} belongs to a different project",
                    parent_id
                )));
            }
        }

        for predecessor in &task.predecessors {
            let other = self.require_task(*predecessor)?;
            if other.project_id != task.project_id {
                return Err(EstateError::Validation(format!(
                    "Predecessor {} belongs to a different project",
                    predecessor
                )));
            }
        }

        Ok(())
    }

    /// Walk up from the new parent; meeting the task itself means a cycle
    fn check_no_cycle(&self, task: &ProjectTask) -> EstateResult<()> {
        let mut seen = HashSet::new();
        let mut current = task.parent_task_id;
        while let Some(id) = current {
            if id == task.id || !seen.insert(id) {
                return Err(EstateError::Validation(format!(
                    "Task {} cannot be its own ancestor",
                    task.id
                )));
            }
            current = self.require_task(id)?.parent_task_id;
        }
        Ok(())
    }
}

fn build_node(task: ProjectTask, children: &mut HashMap<TaskId, Vec<ProjectTask>>) -> TaskNode {
    let kids = children.remove(&task.id).unwrap_or_default();
    TaskNode {
        children: kids
            .into_iter()
            .map(|child| build_node(child, children))
            .collect(),
        task,
    }
}

/// Duration-weighted mean completion; a plain mean when every task has
/// zero duration
fn weighted_completion(tasks: &[&ProjectTask]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }

    let total: i64 = tasks.iter().map(|t| t.duration_days.max(0)).sum();
    if total == 0 {
        return tasks.iter().map(|t| t.completion_percentage).sum::<f64>() / tasks.len() as f64;
    }

    tasks
        .iter()
        .map(|t| t.completion_percentage * t.duration_days.max(0) as f64)
        .sum::<f64>()
        / total as f64
}
