//! Transaction display formatting

use tabled::Tabled;

use super::{fmt_date, or_dash, render, yes_no};
use crate::models::Transaction;

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Amounts are shown signed so expenses stand out
pub fn format_transaction_list(transactions: &[Transaction]) -> String {
    let rows = transactions
        .iter()
        .map(|t| TransactionRow {
            id: t.id.to_string(),
            date: fmt_date(t.date),
            kind: t.kind.to_string(),
            amount: t.signed_amount().to_string(),
            category: or_dash(t.category.as_deref()),
            description: t.description.clone().unwrap_or_default(),
        })
        .collect();
    render(rows, "No transactions found.")
}

pub fn format_transaction_details(txn: &Transaction) -> String {
    let mut output = String::new();
    output.push_str(&format!("Transaction {}\n", txn.id));
    output.push_str(&format!("  Date:        {}\n", fmt_date(txn.date)));
    output.push_str(&format!("  Kind:        {}\n", txn.kind));
    output.push_str(&format!("  Amount:      {}\n", txn.amount));
    output.push_str(&format!("  Category:    {}\n", or_dash(txn.category.as_deref())));
    output.push_str(&format!("  Description: {}\n", or_dash(txn.description.as_deref())));
    output.push_str(&format!("  Reference:   {}\n", or_dash(txn.reference.as_deref())));
    output.push_str(&format!("  Payee:       {}\n", or_dash(txn.payee.as_deref())));
    output.push_str(&format!("  Asset:       {}\n", or_dash(txn.asset_id)));
    output.push_str(&format!("  Project:     {}\n", or_dash(txn.project_id)));
    output.push_str(&format!("  Reconciled:  {}\n", yes_no(txn.is_reconciled)));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, TransactionKind};
    use chrono::NaiveDate;

    #[test]
    fn test_expense_shown_negative() {
        let txn = Transaction::new(
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            TransactionKind::Expense,
            Money::from_dollars(300),
        );
        let out = format_transaction_list(&[txn]);
        assert!(out.contains("-$300.00"));
    }
}
