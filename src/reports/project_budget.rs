//! Project Budget Report
//!
//! Budget against recorded cost for each project, with the cost sources
//! found in the ledger, monthly expenses, committed quotes and tasks.

use std::io::Write;

use crate::error::{EstateError, EstateResult};
use crate::export::csv::escape_csv;
use crate::services::{BudgetReport, CostRollup, ProjectService};
use crate::storage::projects::ProjectFilter;
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct ProjectBudgetReport {
    pub budget: BudgetReport,
}

impl ProjectBudgetReport {
    pub fn generate(storage: &Storage, filter: &ProjectFilter) -> EstateResult<Self> {
        let budget = ProjectService::new(storage).budget_report(filter)?;
        Ok(Self { budget })
    }

    pub fn over_budget(&self) -> Vec<&CostRollup> {
        self.budget.rows.iter().filter(|r| r.is_over_budget()).collect()
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str("Project Budget Report\n");
        output.push_str(&"=".repeat(100));
        output.push('\n');
        output.push_str(&format!(
            "{:<28} {:<14} {:>14} {:>14} {:>14} {:>7} {:>14}\n",
            "Project", "Status", "Budget", "Actual", "Variance", "Used", "Contingency"
        ));
        output.push_str(&"-".repeat(100));
        output.push('\n');

        for row in &self.budget.rows {
            let marker = if row.is_over_budget() { " !" } else { "" };
            output.push_str(&format!(
                "{:<28} {:<14} {:>14} {:>14} {:>14} {:>6.1}% {:>14}{}\n",
                row.project.name,
                row.project.status.to_string(),
                row.project.budget,
                row.project.actual_cost,
                row.variance,
                row.percent_used,
                row.contingency_remaining,
                marker
            ));
            output.push_str(&format!(
                "    ledger {}  monthly {}  quotes {}  tasks est {} / act {}\n",
                row.sources.transactions,
                row.sources.monthly_expenses,
                row.sources.committed_quotes,
                row.sources.task_estimated,
                row.sources.task_actual
            ));
        }

        output.push_str(&"-".repeat(100));
        output.push('\n');
        output.push_str(&format!(
            "{:<28} {:<14} {:>14} {:>14} {:>14} {:>7} {:>14}\n",
            "TOTAL",
            "",
            self.budget.total_budget,
            self.budget.total_actual,
            self.budget.total_variance,
            "",
            self.budget.total_contingency
        ));

        let over = self.over_budget();
        if !over.is_empty() {
            output.push_str(&format!("\n{} project(s) over budget\n", over.len()));
        }

        output
    }

    /// Export the rollup rows to CSV
    pub fn export_csv<W: Write>(&self, writer: &mut W) -> EstateResult<()> {
        writeln!(
            writer,
            "Project ID,Project,Status,Budget,Actual Cost,Variance,Percent Used,Contingency Remaining,\
             Ledger Expenses,Monthly Expenses,Committed Quotes,Task Estimated,Task Actual"
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;

        for row in &self.budget.rows {
            writeln!(
                writer,
                "{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
                row.project.id,
                escape_csv(&row.project.name),
                row.project.status,
                row.project.budget.as_f64(),
                row.project.actual_cost.as_f64(),
                row.variance.as_f64(),
                row.percent_used,
                row.contingency_remaining.as_f64(),
                row.sources.transactions.as_f64(),
                row.sources.monthly_expenses.as_f64(),
                row.sources.committed_quotes.as_f64(),
                row.sources.task_estimated.as_f64(),
                row.sources.task_actual.as_f64()
            )
            .map_err(|e| EstateError::Export(e.to_string()))?;
        }

        writeln!(
            writer,
            ",TOTAL,,{:.2},{:.2},{:.2},,{:.2},,,,,",
            self.budget.total_budget.as_f64(),
            self.budget.total_actual.as_f64(),
            self.budget.total_variance.as_f64(),
            self.budget.total_contingency.as_f64()
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;

        Ok(())
    }
}
