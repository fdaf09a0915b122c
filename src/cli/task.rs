//! Project task (WBS) CLI commands

use clap::Subcommand;

use super::{parse_choice, parse_date, parse_opt_date, parse_opt_money, today};
use crate::display::task::{format_schedule_summary, format_task_list, format_task_tree};
use crate::error::{EstateError, EstateResult};
use crate::models::{DependencyType, ProjectTask, TaskId, TaskStatus};
use crate::services::{ProjectService, TaskService};
use crate::storage::Storage;

const TASK_STATUSES: &str = "not_started, in_progress, completed, on_hold, delayed";
const DEPENDENCY_TYPES: &str = "FS, SS, FF, SF";

/// Task subcommands
#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to a project
    Add {
        /// Project name, code or ID
        project: String,
        /// Task name
        name: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Finish date (YYYY-MM-DD)
        #[arg(long)]
        finish: String,
        /// WBS code (e.g., "1.2")
        #[arg(short, long)]
        code: Option<String>,
        /// Parent task ID or code
        #[arg(long)]
        parent: Option<String>,
        /// Comma-separated predecessor task IDs
        #[arg(long)]
        predecessors: Option<String>,
        /// FS, SS, FF or SF
        #[arg(long, default_value = "FS")]
        dependency: String,
        #[arg(long, default_value = "0")]
        lag: i64,
        #[arg(long)]
        sort: Option<i32>,
        #[arg(long)]
        contractor: Option<String>,
        #[arg(long)]
        estimated_cost: Option<String>,
        /// Mark as on the critical path
        #[arg(long)]
        critical: bool,
    },
    /// List a project's tasks
    List {
        project: String,
        /// Only tasks at this WBS level
        #[arg(short, long)]
        level: Option<u32>,
        /// Only critical-path tasks
        #[arg(long)]
        critical: bool,
    },
    /// Show the WBS as an indented tree
    Tree { project: String },
    /// Update a task
    Update {
        /// Task ID, or code when --project is given
        task: String,
        #[arg(short, long)]
        project: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        finish: Option<String>,
        #[arg(long)]
        actual_start: Option<String>,
        #[arg(long)]
        actual_finish: Option<String>,
        /// Completion percentage (0-100)
        #[arg(long)]
        completion: Option<f64>,
        #[arg(short, long)]
        status: Option<String>,
        /// New parent task ID or code; "none" moves the task to the top level
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        predecessors: Option<String>,
        #[arg(long)]
        contractor: Option<String>,
        #[arg(long)]
        estimated_cost: Option<String>,
        #[arg(long)]
        actual_cost: Option<String>,
        #[arg(long)]
        critical: Option<bool>,
    },
    /// Delete a task; its subtasks move up to its parent
    Delete {
        task: String,
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Schedule dates, completion and overdue tasks
    Schedule { project: String },
}

/// Handle a task command
pub fn handle_task_command(storage: &Storage, cmd: TaskCommands) -> EstateResult<()> {
    let service = TaskService::new(storage);
    let projects = ProjectService::new(storage);

    match cmd {
        TaskCommands::Add {
            project,
            name,
            start,
            finish,
            code,
            parent,
            predecessors,
            dependency,
            lag,
            sort,
            contractor,
            estimated_cost,
            critical,
        } => {
            let project = projects.require(&project)?;
            let mut task =
                ProjectTask::new(project.id, name, parse_date(&start)?, parse_date(&finish)?);
            task.code = code;
            task.parent_task_id = match parent {
                Some(p) => Some(service.require(&p, Some(project.id))?.id),
                None => None,
            };
            if let Some(text) = predecessors {
                task.predecessors = parse_predecessors(&text)?;
            }
            task.dependency_type =
                parse_choice(&dependency, "dependency type", DEPENDENCY_TYPES, DependencyType::parse)?;
            task.lag_days = lag;
            if let Some(sort) = sort {
                task.sort_order = sort;
            }
            task.contractor = contractor;
            task.estimated_cost = parse_opt_money(estimated_cost.as_deref(), "estimated cost")?;
            task.is_critical = critical;

            let task = service.add(task)?;
            println!(
                "Added task {} to {} (level {}, {} days)",
                task, project.name, task.wbs_level, task.duration_days
            );
            println!("  ID: {}", task.id);
        }

        TaskCommands::List {
            project,
            level,
            critical,
        } => {
            let project = projects.require(&project)?;
            let tasks = if critical {
                service.critical_tasks(project.id)?
            } else {
                service.list(project.id, level)?
            };
            print!("{}", format_task_list(&tasks));
        }

        TaskCommands::Tree { project } => {
            let project = projects.require(&project)?;
            print!("{}", format_task_tree(&service.hierarchy(project.id)?));
        }

        TaskCommands::Update {
            task,
            project,
            name,
            start,
            finish,
            actual_start,
            actual_finish,
            completion,
            status,
            parent,
            predecessors,
            contractor,
            estimated_cost,
            actual_cost,
            critical,
        } => {
            let project_id = match project {
                Some(p) => Some(projects.require(&p)?.id),
                None => None,
            };
            let mut found = service.require(&task, project_id)?;
            let before = found.clone();

            if let Some(name) = name {
                found.name = name;
            }
            let mut dates_changed = false;
            if let Some(d) = start {
                found.start_date = parse_date(&d)?;
                dates_changed = true;
            }
            if let Some(d) = finish {
                found.finish_date = parse_date(&d)?;
                dates_changed = true;
            }
            if dates_changed {
                found.duration_days = (found.finish_date - found.start_date).num_days();
            }
            if let Some(d) = parse_opt_date(actual_start.as_deref())? {
                found.actual_start_date = Some(d);
            }
            if let Some(d) = parse_opt_date(actual_finish.as_deref())? {
                found.actual_finish_date = Some(d);
            }
            if let Some(pct) = completion {
                found.completion_percentage = pct;
            }
            if let Some(s) = status {
                found.status = parse_choice(&s, "status", TASK_STATUSES, TaskStatus::parse)?;
            }
            if let Some(p) = parent {
                found.parent_task_id = if p.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(service.require(&p, Some(found.project_id))?.id)
                };
            }
            if let Some(text) = predecessors {
                found.predecessors = parse_predecessors(&text)?;
            }
            if contractor.is_some() {
                found.contractor = contractor;
            }
            if let Some(cost) = parse_opt_money(estimated_cost.as_deref(), "estimated cost")? {
                found.estimated_cost = Some(cost);
            }
            if let Some(cost) = parse_opt_money(actual_cost.as_deref(), "actual cost")? {
                found.actual_cost = Some(cost);
            }
            if let Some(c) = critical {
                found.is_critical = c;
            }

            if found == before {
                println!("No changes specified. Use --help to see editable fields.");
                return Ok(());
            }

            let updated = service.update(found)?;
            println!("Updated task {} ({:.0}% done)", updated, updated.completion_percentage);
        }

        TaskCommands::Delete { task, project } => {
            let project_id = match project {
                Some(p) => Some(projects.require(&p)?.id),
                None => None,
            };
            let found = service.require(&task, project_id)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted task {}", deleted);
        }

        TaskCommands::Schedule { project } => {
            let project = projects.require(&project)?;
            println!("Schedule: {}", project.name);
            print!(
                "{}",
                format_schedule_summary(&service.schedule_summary(project.id, today())?)
            );
        }
    }

    Ok(())
}

fn parse_predecessors(text: &str) -> EstateResult<Vec<TaskId>> {
    ProjectTask::parse_predecessors(text).map_err(|e| EstateError::Validation(e.to_string()))
}
