//! Project task display formatting

use tabled::Tabled;

use super::{fmt_date, opt_date, or_dash, render};
use crate::models::ProjectTask;
use crate::services::{ScheduleSummary, TaskNode};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Lvl")]
    level: u32,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "Finish")]
    finish: String,
    #[tabled(rename = "Done")]
    completion: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Pred")]
    predecessors: String,
    #[tabled(rename = "Crit")]
    critical: &'static str,
}

pub fn format_task_list(tasks: &[ProjectTask]) -> String {
    let rows = tasks
        .iter()
        .map(|t| TaskRow {
            id: t.id.to_string(),
            code: or_dash(t.code.as_deref()),
            name: t.name.clone(),
            level: t.wbs_level,
            start: fmt_date(t.start_date),
            finish: fmt_date(t.finish_date),
            completion: format!("{:.0}%", t.completion_percentage),
            status: t.status.to_string(),
            predecessors: t.predecessors_to_text(),
            critical: if t.is_critical { "*" } else { "" },
        })
        .collect();
    render(rows, "No tasks found.")
}

/// Indented WBS outline
pub fn format_task_tree(roots: &[TaskNode]) -> String {
    if roots.is_empty() {
        return "No tasks found.".to_string();
    }

    let mut output = String::new();
    for node in roots {
        write_node(&mut output, node, 0);
    }
    output
}

fn write_node(output: &mut String, node: &TaskNode, depth: usize) {
    let task = &node.task;
    let label = match &task.code {
        Some(code) => format!("{} {}", code, task.name),
        None => task.name.clone(),
    };
    output.push_str(&format!(
        "{:indent$}{}{}  [{} .. {}] {:.0}%\n",
        "",
        label,
        if task.is_critical { " *" } else { "" },
        fmt_date(task.start_date),
        fmt_date(task.finish_date),
        task.completion_percentage,
        indent = depth * 2
    ));
    for child in &node.children {
        write_node(output, child, depth + 1);
    }
}

pub fn format_schedule_summary(summary: &ScheduleSummary) -> String {
    if summary.task_count == 0 {
        return "No tasks scheduled.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!("Tasks:          {}\n", summary.task_count));
    output.push_str(&format!("Start:          {}\n", opt_date(summary.earliest_start)));
    output.push_str(&format!("Finish:         {}\n", opt_date(summary.latest_finish)));
    output.push_str(&format!("Duration:       {} days\n", summary.total_duration_days));
    output.push_str(&format!("Completion:     {:.1}%\n", summary.weighted_completion));

    if summary.overdue.is_empty() {
        output.push_str("Overdue:        none\n");
    } else {
        output.push_str(&format!("Overdue:        {}\n", summary.overdue.len()));
        for task in &summary.overdue {
            output.push_str(&format!(
                "  {} {} (due {}, {:.0}% done)\n",
                task.id,
                task.name,
                fmt_date(task.finish_date),
                task.completion_percentage
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectId;
    use chrono::NaiveDate;

    fn task(name: &str) -> ProjectTask {
        ProjectTask::new(
            ProjectId::new(1),
            name,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        )
    }

    #[test]
    fn test_tree_indents_children() {
        let tree = vec![TaskNode {
            task: task("Civil"),
            children: vec![TaskNode {
                task: task("Earthworks"),
                children: Vec::new(),
            }],
        }];
        let out = format_task_tree(&tree);
        assert!(out.contains("Civil  ["));
        assert!(out.contains("\n  Earthworks  ["));
    }

    #[test]
    fn test_schedule_summary_empty() {
        assert_eq!(
            format_schedule_summary(&ScheduleSummary::default()),
            "No tasks scheduled.\n"
        );
    }

    #[test]
    fn test_schedule_summary_lists_overdue() {
        let summary = ScheduleSummary {
            task_count: 1,
            earliest_start: NaiveDate::from_ymd_opt(2025, 1, 1),
            latest_finish: NaiveDate::from_ymd_opt(2025, 2, 1),
            total_duration_days: 31,
            weighted_completion: 40.0,
            overdue: vec![task("Earthworks")],
        };
        let out = format_schedule_summary(&summary);
        assert!(out.contains("Overdue:        1"));
        assert!(out.contains("Earthworks"));
    }
}
