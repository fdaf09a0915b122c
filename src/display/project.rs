//! Project display formatting

use tabled::Tabled;

use super::{opt_date, or_dash, render, yes_no};
use crate::models::Project;
use crate::services::CostRollup;

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Budget")]
    budget: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Done")]
    completion: String,
}

pub fn format_project_list(projects: &[Project]) -> String {
    let rows = projects
        .iter()
        .map(|p| ProjectRow {
            id: p.id.to_string(),
            code: or_dash(p.code.as_deref()),
            name: p.name.clone(),
            status: p.status.to_string(),
            budget: p.budget.to_string(),
            actual: p.actual_cost.to_string(),
            completion: format!("{:.0}%", p.completion_percentage),
        })
        .collect();
    render(rows, "No projects found.")
}

pub fn format_project_details(project: &Project, asset_name: Option<&str>, timeline: f64) -> String {
    let mut output = String::new();

    output.push_str(&format!("Project: {}\n", project.name));
    output.push_str(&format!("  ID:                 {}\n", project.id));
    output.push_str(&format!("  Code:               {}\n", or_dash(project.code.as_deref())));
    output.push_str(&format!("  Asset:              {}\n", or_dash(asset_name)));
    output.push_str(&format!("  Type:               {}\n", or_dash(project.project_type.as_deref())));
    output.push_str(&format!("  Status:             {}\n", project.status));
    output.push_str(&format!("  Active:             {}\n", yes_no(project.is_active)));
    output.push('\n');
    output.push_str(&format!("  Budget:             {}\n", project.budget));
    output.push_str(&format!("  Actual Cost:        {}\n", project.actual_cost));
    output.push_str(&format!("  Contingency:        {}\n", project.contingency));
    output.push_str(&format!("  Completion:         {:.1}%\n", project.completion_percentage));
    output.push_str(&format!("  Timeline Elapsed:   {:.1}%\n", timeline));
    output.push('\n');
    output.push_str(&format!("  Start:              {}\n", opt_date(project.start_date)));
    output.push_str(&format!("  Expected Completion:{}\n", pad_date(project.expected_completion)));
    output.push_str(&format!("  Actual Start:       {}\n", opt_date(project.actual_start_date)));
    output.push_str(&format!("  Actual Completion:  {}\n", opt_date(project.actual_completion_date)));

    if let Some(description) = &project.description {
        output.push_str(&format!("\n  {}\n", description));
    }

    output
}

fn pad_date(date: Option<chrono::NaiveDate>) -> String {
    format!(" {}", opt_date(date))
}

pub fn format_cost_rollup(rollup: &CostRollup) -> String {
    let mut output = String::new();
    let project = &rollup.project;

    output.push_str(&format!("Cost Rollup: {}\n", project.name));
    output.push_str(&format!("  Budget:               {:>16}\n", project.budget));
    output.push_str(&format!("  Actual Cost:          {:>16}\n", project.actual_cost));
    output.push_str(&format!("  Variance:             {:>16}\n", rollup.variance));
    output.push_str(&format!("  Budget Used:          {:>15.1}%\n", rollup.percent_used));
    output.push_str(&format!("  Contingency:          {:>16}\n", project.contingency));
    output.push_str(&format!("  Contingency Left:     {:>16}\n", rollup.contingency_remaining));
    output.push('\n');
    output.push_str("  Recorded against this project:\n");
    output.push_str(&format!("    Ledger expenses:    {:>16}\n", rollup.sources.transactions));
    output.push_str(&format!("    Monthly expenses:   {:>16}\n", rollup.sources.monthly_expenses));
    output.push_str(&format!("    Committed quotes:   {:>16}\n", rollup.sources.committed_quotes));
    output.push_str(&format!("    Task estimates:     {:>16}\n", rollup.sources.task_estimated));
    output.push_str(&format!("    Task actuals:       {:>16}\n", rollup.sources.task_actual));

    if rollup.is_over_budget() {
        output.push_str("\n  OVER BUDGET\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use crate::storage::projects::ProjectCostSources;

    #[test]
    fn test_project_list() {
        let mut project = Project::new("Stage 1 Civil Works");
        project.code = Some("SC-01".into());
        project.budget = Money::from_dollars(1_000_000);

        let out = format_project_list(&[project]);
        assert!(out.contains("SC-01"));
        assert!(out.contains("$1,000,000.00"));
    }

    #[test]
    fn test_rollup_flags_overrun() {
        let mut project = Project::new("Fitout");
        project.budget = Money::from_dollars(100);
        project.actual_cost = Money::from_dollars(150);
        let rollup = CostRollup::from_sources(project, ProjectCostSources::default());

        assert!(format_cost_rollup(&rollup).contains("OVER BUDGET"));
    }
}
