//! Monthly expense and import batch display formatting

use tabled::Tabled;

use super::{or_dash, render};
use crate::models::{ImportBatch, Money, MonthlyExpense};

#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

pub fn format_expense_list(expenses: &[MonthlyExpense]) -> String {
    let rows = expenses
        .iter()
        .map(|e| ExpenseRow {
            id: e.id.to_string(),
            period: format!("{}-{:02}", e.year, e.month),
            category: e.category.clone(),
            amount: e.amount.to_string(),
            asset: or_dash(e.asset_id),
            project: or_dash(e.project_id),
            notes: e.notes.clone(),
        })
        .collect();
    render(rows, "No monthly expenses found.")
}

/// Two-column totals with a TOTAL footer, for by-month and by-category views
pub fn format_totals<K: ToString>(heading: &str, totals: &[(K, Money)]) -> String {
    if totals.is_empty() {
        return "No expenses in range.".to_string();
    }

    let label_width = totals
        .iter()
        .map(|(k, _)| k.to_string().len())
        .max()
        .unwrap_or(0)
        .max(heading.len())
        .max(5);

    let mut output = String::new();
    output.push_str(&format!("{:<w$}  {:>16}\n", heading, "Amount", w = label_width));
    output.push_str(&format!("{:-<w$}  {:-<16}\n", "", "", w = label_width));

    for (key, amount) in totals {
        output.push_str(&format!(
            "{:<w$}  {:>16}\n",
            key.to_string(),
            amount,
            w = label_width
        ));
    }

    let total: Money = totals.iter().map(|(_, amount)| *amount).sum();
    output.push_str(&format!("{:-<w$}  {:-<16}\n", "", "", w = label_width));
    output.push_str(&format!("{:<w$}  {:>16}\n", "TOTAL", total, w = label_width));

    output
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Batch")]
    batch_id: String,
    #[tabled(rename = "File")]
    file_name: String,
    #[tabled(rename = "Inserted")]
    inserted: u32,
    #[tabled(rename = "Updated")]
    updated: u32,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Imported At")]
    created_at: String,
}

pub fn format_batch_list(batches: &[ImportBatch]) -> String {
    let rows = batches
        .iter()
        .map(|b| BatchRow {
            batch_id: b.batch_id.to_string(),
            file_name: b.file_name.clone(),
            inserted: b.inserted_count,
            updated: b.updated_count,
            status: b.status.to_string(),
            created_at: b.created_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();
    render(rows, "No imports recorded.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YearMonth;

    #[test]
    fn test_expense_list() {
        let period = YearMonth::new(2025, 3).unwrap();
        let expense = MonthlyExpense::new(period, "Rates", Money::from_dollars(4200));
        let out = format_expense_list(&[expense]);
        assert!(out.contains("2025-03"));
        assert!(out.contains("$4,200.00"));
    }

    #[test]
    fn test_totals_footer() {
        let totals = vec![
            ("Insurance".to_string(), Money::from_dollars(100)),
            ("Rates".to_string(), Money::from_dollars(250)),
        ];
        let out = format_totals("Category", &totals);
        assert!(out.contains("TOTAL"));
        assert!(out.contains("$350.00"));
    }

    #[test]
    fn test_totals_empty() {
        let totals: Vec<(String, Money)> = Vec::new();
        assert_eq!(format_totals("Month", &totals), "No expenses in range.");
    }
}
