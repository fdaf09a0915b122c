//! Project CLI commands

use clap::Subcommand;

use super::{parse_choice, parse_money, parse_opt_date, today};
use crate::display::project::{format_cost_rollup, format_project_details, format_project_list};
use crate::error::EstateResult;
use crate::models::{Project, ProjectStatus};
use crate::services::{AssetService, ProjectService};
use crate::storage::{ProjectFilter, Storage};

const PROJECT_STATUSES: &str =
    "planning, under_review, approved, construction, completed, on_hold, cancelled";

/// Project subcommands
#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a development project
    Create {
        /// Project name
        name: String,
        /// Short unique code (e.g., "SC-01")
        #[arg(short, long)]
        code: Option<String>,
        /// Asset the project belongs to (name or ID)
        #[arg(short, long)]
        asset: Option<String>,
        /// Project type (e.g., "new_build", "refurbishment")
        #[arg(short = 't', long)]
        project_type: Option<String>,
        #[arg(short, long, default_value = "planning")]
        status: String,
        /// Approved budget
        #[arg(short, long, default_value = "0")]
        budget: String,
        /// Contingency allowance
        #[arg(long, default_value = "0")]
        contingency: String,
        /// Planned start (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Expected completion (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List projects
    List {
        /// Filter by asset (name or ID)
        #[arg(short, long)]
        asset: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        /// Only projects flagged active
        #[arg(long)]
        active: bool,
    },
    /// Show project details
    Show {
        /// Project name, code or ID
        project: String,
    },
    /// Edit a project
    Edit {
        /// Project name, code or ID
        project: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        code: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        budget: Option<String>,
        /// Recorded actual cost to date
        #[arg(long)]
        actual_cost: Option<String>,
        #[arg(long)]
        contingency: Option<String>,
        /// Completion percentage (0-100)
        #[arg(long)]
        completion: Option<f64>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        actual_start: Option<String>,
        #[arg(long)]
        actual_end: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Mark active (true) or inactive (false)
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a project and its tasks
    Delete {
        /// Project name, code or ID
        project: String,
    },
    /// Budget against costs recorded elsewhere
    Rollup {
        /// Project name, code or ID
        project: String,
    },
    /// Totals across all projects
    Stats,
}

/// Handle a project command
pub fn handle_project_command(storage: &Storage, cmd: ProjectCommands) -> EstateResult<()> {
    let service = ProjectService::new(storage);

    match cmd {
        ProjectCommands::Create {
            name,
            code,
            asset,
            project_type,
            status,
            budget,
            contingency,
            start,
            end,
            description,
        } => {
            let mut project = Project::new(name);
            project.code = code;
            project.asset_id = match asset {
                Some(asset) => Some(AssetService::new(storage).require(&asset)?.id),
                None => None,
            };
            project.project_type = project_type;
            project.status =
                parse_choice(&status, "status", PROJECT_STATUSES, ProjectStatus::parse)?;
            project.budget = parse_money(&budget, "budget")?;
            project.contingency = parse_money(&contingency, "contingency")?;
            project.start_date = parse_opt_date(start.as_deref())?;
            project.expected_completion = parse_opt_date(end.as_deref())?;
            project.description = description;

            let project = service.create(project)?;
            println!("Created project: {}", project.name);
            println!("  Budget: {}", project.budget);
            println!("  Status: {}", project.status);
            println!("  ID:     {}", project.id);
        }

        ProjectCommands::List {
            asset,
            status,
            active,
        } => {
            let filter = ProjectFilter {
                asset_id: match asset {
                    Some(asset) => Some(AssetService::new(storage).require(&asset)?.id),
                    None => None,
                },
                status: status
                    .as_deref()
                    .map(|s| parse_choice(s, "status", PROJECT_STATUSES, ProjectStatus::parse))
                    .transpose()?,
                active_only: active,
            };
            print!("{}", format_project_list(&service.list(&filter)?));
        }

        ProjectCommands::Show { project } => {
            let found = service.require(&project)?;
            let asset_name = match found.asset_id {
                Some(id) => storage.assets().get(id)?.map(|a| a.name),
                None => None,
            };
            let timeline = found.timeline_completion(today());
            print!(
                "{}",
                format_project_details(&found, asset_name.as_deref(), timeline)
            );
        }

        ProjectCommands::Edit {
            project,
            name,
            code,
            status,
            budget,
            actual_cost,
            contingency,
            completion,
            start,
            end,
            actual_start,
            actual_end,
            description,
            active,
        } => {
            let mut found = service.require(&project)?;
            let before = found.clone();

            if let Some(name) = name {
                found.name = name;
            }
            if code.is_some() {
                found.code = code;
            }
            if let Some(s) = status {
                found.status = parse_choice(&s, "status", PROJECT_STATUSES, ProjectStatus::parse)?;
            }
            if let Some(b) = budget {
                found.budget = parse_money(&b, "budget")?;
            }
            if let Some(a) = actual_cost {
                found.actual_cost = parse_money(&a, "actual cost")?;
            }
            if let Some(c) = contingency {
                found.contingency = parse_money(&c, "contingency")?;
            }
            if let Some(pct) = completion {
                found.completion_percentage = pct;
            }
            if let Some(d) = parse_opt_date(start.as_deref())? {
                found.start_date = Some(d);
            }
            if let Some(d) = parse_opt_date(end.as_deref())? {
                found.expected_completion = Some(d);
            }
            if let Some(d) = parse_opt_date(actual_start.as_deref())? {
                found.actual_start_date = Some(d);
            }
            if let Some(d) = parse_opt_date(actual_end.as_deref())? {
                found.actual_completion_date = Some(d);
            }
            if description.is_some() {
                found.description = description;
            }
            if let Some(active) = active {
                found.is_active = active;
            }

            if found == before {
                println!("No changes specified. Use --help to see editable fields.");
                return Ok(());
            }

            let updated = service.update(found)?;
            println!("Updated project: {}", updated.name);
        }

        ProjectCommands::Delete { project } => {
            let found = service.require(&project)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted project: {}", deleted.name);
        }

        ProjectCommands::Rollup { project } => {
            let found = service.require(&project)?;
            print!("{}", format_cost_rollup(&service.cost_rollup(found.id)?));
        }

        ProjectCommands::Stats => {
            println!("Active projects:    {}", service.active_projects_count()?);
            println!("Total budget:       {}", service.total_budget()?);
            println!("Total actual cost:  {}", service.total_actual_cost()?);
            println!("Average completion: {:.1}%", service.average_completion()?);
        }
    }

    Ok(())
}
