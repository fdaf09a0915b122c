//! CSV Export functionality
//!
//! One CSV file per table, with related names resolved so the files open
//! cleanly in a spreadsheet.

use std::collections::HashMap;
use std::io::Write;

use crate::error::{EstateError, EstateResult};
use crate::models::{AssetId, Money, ProjectId};
use crate::storage::{AssetFilter, ExpenseFilter, ProjectFilter, Storage, TransactionFilter};

/// Tables that can be exported individually
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvTable {
    Assets,
    Projects,
    Transactions,
    Consultants,
    Quotes,
    Expenses,
    Tasks,
}

impl CsvTable {
    pub const ALL: [CsvTable; 7] = [
        CsvTable::Assets,
        CsvTable::Projects,
        CsvTable::Transactions,
        CsvTable::Consultants,
        CsvTable::Quotes,
        CsvTable::Expenses,
        CsvTable::Tasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::Projects => "projects",
            Self::Transactions => "transactions",
            Self::Consultants => "consultants",
            Self::Quotes => "quotes",
            Self::Expenses => "expenses",
            Self::Tasks => "tasks",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s.trim().to_lowercase())
    }
}

/// Write one table as CSV
pub fn export_table_csv<W: Write>(storage: &Storage, table: CsvTable, writer: &mut W) -> EstateResult<()> {
    match table {
        CsvTable::Assets => export_assets_csv(storage, writer),
        CsvTable::Projects => export_projects_csv(storage, writer),
        CsvTable::Transactions => export_transactions_csv(storage, writer),
        CsvTable::Consultants => export_consultants_csv(storage, writer),
        CsvTable::Quotes => export_quotes_csv(storage, writer),
        CsvTable::Expenses => export_expenses_csv(storage, writer),
        CsvTable::Tasks => export_tasks_csv(storage, writer),
    }
}

fn asset_names(storage: &Storage) -> EstateResult<HashMap<AssetId, String>> {
    Ok(storage
        .assets()
        .list(&AssetFilter::default())?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect())
}

fn project_names(storage: &Storage) -> EstateResult<HashMap<ProjectId, String>> {
    Ok(storage
        .projects()
        .list(&ProjectFilter::default())?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}

fn name_of<K: std::hash::Hash + Eq>(names: &HashMap<K, String>, id: Option<K>) -> String {
    id.and_then(|id| names.get(&id).cloned()).unwrap_or_default()
}

fn amount(value: Option<Money>) -> String {
    value.map(|m| format!("{:.2}", m.as_f64())).unwrap_or_default()
}

pub fn export_assets_csv<W: Write>(storage: &Storage, writer: &mut W) -> EstateResult<()> {
    writeln!(
        writer,
        "ID,Name,Type,Status,Region,Address,Land Area,Building Area,Purchase Price,Valuation,Acquired,Notes"
    )
    .map_err(|e| EstateError::Export(e.to_string()))?;

    for asset in storage.assets().list(&AssetFilter::default())? {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            asset.id,
            escape_csv(&asset.name),
            asset.asset_type,
            asset.status,
            escape_csv(asset.region.as_deref().unwrap_or("")),
            escape_csv(asset.address.as_deref().unwrap_or("")),
            asset.land_area_sqm.map(|v| v.to_string()).unwrap_or_default(),
            asset.building_area_sqm.map(|v| v.to_string()).unwrap_or_default(),
            amount(asset.purchase_price),
            amount(asset.current_valuation),
            asset.acquisition_date.map(|d| d.to_string()).unwrap_or_default(),
            escape_csv(&asset.notes)
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;
    }

    Ok(())
}

pub fn export_projects_csv<W: Write>(storage: &Storage, writer: &mut W) -> EstateResult<()> {
    let assets = asset_names(storage)?;

    writeln!(
        writer,
        "ID,Code,Name,Asset,Type,Status,Budget,Actual Cost,Contingency,Completion %,Start,Expected Completion,Active"
    )
    .map_err(|e| EstateError::Export(e.to_string()))?;

    for project in storage.projects().list(&ProjectFilter::default())? {
        writeln!(
            writer,
            "{},{},{},{},{},{},{:.2},{:.2},{:.2},{:.1},{},{},{}",
            project.id,
            escape_csv(project.code.as_deref().unwrap_or("")),
            escape_csv(&project.name),
            escape_csv(&name_of(&assets, project.asset_id)),
            escape_csv(project.project_type.as_deref().unwrap_or("")),
            project.status,
            project.budget.as_f64(),
            project.actual_cost.as_f64(),
            project.contingency.as_f64(),
            project.completion_percentage,
            project.start_date.map(|d| d.to_string()).unwrap_or_default(),
            project.expected_completion.map(|d| d.to_string()).unwrap_or_default(),
            project.is_active
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;
    }

    Ok(())
}

/// Amounts are signed: income positive, expense negative
pub fn export_transactions_csv<W: Write>(storage: &Storage, writer: &mut W) -> EstateResult<()> {
    let assets = asset_names(storage)?;
    let projects = project_names(storage)?;

    writeln!(
        writer,
        "ID,Date,Kind,Amount,Category,Description,Reference,Payee,Asset,Project,Reconciled"
    )
    .map_err(|e| EstateError::Export(e.to_string()))?;

    for txn in storage.transactions().list(&TransactionFilter::default())? {
        writeln!(
            writer,
            "{},{},{},{:.2},{},{},{},{},{},{},{}",
            txn.id,
            txn.date,
            txn.kind,
            txn.signed_amount().as_f64(),
            escape_csv(txn.category.as_deref().unwrap_or("")),
            escape_csv(txn.description.as_deref().unwrap_or("")),
            escape_csv(txn.reference.as_deref().unwrap_or("")),
            escape_csv(txn.payee.as_deref().unwrap_or("")),
            escape_csv(&name_of(&assets, txn.asset_id)),
            escape_csv(&name_of(&projects, txn.project_id)),
            txn.is_reconciled
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;
    }

    Ok(())
}

pub fn export_consultants_csv<W: Write>(storage: &Storage, writer: &mut W) -> EstateResult<()> {
    writeln!(
        writer,
        "ID,Name,Company,Email,Phone,Category,Typical Scopes,Quality,Reliability,Cost,Active"
    )
    .map_err(|e| EstateError::Export(e.to_string()))?;

    let rating = |r: Option<u8>| r.map(|r| r.to_string()).unwrap_or_default();

    for consultant in storage.consultants().list(None, false)? {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{}",
            consultant.id,
            escape_csv(&consultant.name),
            escape_csv(consultant.company.as_deref().unwrap_or("")),
            escape_csv(consultant.email.as_deref().unwrap_or("")),
            escape_csv(consultant.phone.as_deref().unwrap_or("")),
            escape_csv(consultant.category.as_deref().unwrap_or("")),
            escape_csv(&consultant.typical_scopes.join("; ")),
            rating(consultant.quality_rating),
            rating(consultant.reliability_rating),
            rating(consultant.cost_rating),
            consultant.is_active
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;
    }

    Ok(())
}

pub fn export_quotes_csv<W: Write>(storage: &Storage, writer: &mut W) -> EstateResult<()> {
    let projects = project_names(storage)?;
    let consultants: HashMap<_, _> = storage
        .consultants()
        .list(None, false)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    writeln!(
        writer,
        "ID,Date,Valid Until,Consultant,Project,Scope,Project Type,Project Size,Amount,Actual Amount,Status"
    )
    .map_err(|e| EstateError::Export(e.to_string()))?;

    for quote in storage.quotes().all()? {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{:.2},{},{}",
            quote.id,
            quote.quote_date,
            quote.valid_until.map(|d| d.to_string()).unwrap_or_default(),
            escape_csv(&name_of(&consultants, Some(quote.consultant_id))),
            escape_csv(&name_of(&projects, quote.project_id)),
            escape_csv(quote.scope.as_deref().unwrap_or("")),
            escape_csv(quote.project_type.as_deref().unwrap_or("")),
            quote.project_size.map(|s| s.to_string()).unwrap_or_default(),
            quote.amount.as_f64(),
            amount(quote.actual_amount),
            quote.status
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;
    }

    Ok(())
}

/// Uses the same `year,month,category,amount,notes` columns the importer
/// reads, followed by the owning asset and project
pub fn export_expenses_csv<W: Write>(storage: &Storage, writer: &mut W) -> EstateResult<()> {
    let assets = asset_names(storage)?;
    let projects = project_names(storage)?;

    writeln!(writer, "year,month,category,amount,notes,asset,project")
        .map_err(|e| EstateError::Export(e.to_string()))?;

    for expense in storage.expenses().list(&ExpenseFilter::default())? {
        writeln!(
            writer,
            "{},{},{},{:.2},{},{},{}",
            expense.year,
            expense.month,
            escape_csv(&expense.category),
            expense.amount.as_f64(),
            escape_csv(&expense.notes),
            escape_csv(&name_of(&assets, expense.asset_id)),
            escape_csv(&name_of(&projects, expense.project_id))
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;
    }

    Ok(())
}

pub fn export_tasks_csv<W: Write>(storage: &Storage, writer: &mut W) -> EstateResult<()> {
    let projects = project_names(storage)?;

    writeln!(
        writer,
        "ID,Project,Code,Name,WBS Level,Parent,Start,Finish,Duration,Completion %,Status,Predecessors,Critical"
    )
    .map_err(|e| EstateError::Export(e.to_string()))?;

    for task in storage.tasks().all()? {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{:.1},{},{},{}",
            task.id,
            escape_csv(&name_of(&projects, Some(task.project_id))),
            escape_csv(task.code.as_deref().unwrap_or("")),
            escape_csv(&task.name),
            task.wbs_level,
            task.parent_task_id.map(|id| id.to_string()).unwrap_or_default(),
            task.start_date,
            task.finish_date,
            task.duration_days,
            task.completion_percentage,
            task.status,
            escape_csv(&task.predecessors_to_text()),
            task.is_critical
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;
    }

    Ok(())
}

/// Escape a string for CSV format
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Asset, AssetType, MonthlyExpense, Transaction, TransactionKind, YearMonth};
    use crate::services::{AssetService, ExpenseService, ImportTarget, TransactionService};
    use chrono::NaiveDate;

    #[test]
    fn test_transactions_are_signed() {
        let storage = Storage::in_memory().unwrap();
        let asset = AssetService::new(&storage)
            .create(Asset::new("Hub, Eagle Farm", AssetType::Warehouse))
            .unwrap();

        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            TransactionKind::Expense,
            Money::from_dollars(450),
        );
        txn.asset_id = Some(asset.id);
        txn.category = Some("Maintenance".into());
        TransactionService::new(&storage).add(txn).unwrap();

        let mut out = Vec::new();
        export_table_csv(&storage, CsvTable::Transactions, &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(",expense,-450.00,Maintenance,"));
        assert!(row.contains("\"Hub, Eagle Farm\""));
    }

    #[test]
    fn test_expense_export_reimports() {
        let storage = Storage::in_memory().unwrap();
        let service = ExpenseService::new(&storage);
        let period = YearMonth::new(2025, 4).unwrap();
        service
            .upsert(MonthlyExpense::new(period, "Insurance", Money::from_dollars(1_200)))
            .unwrap();

        let mut out = Vec::new();
        export_expenses_csv(&storage, &mut out).unwrap();

        let other = Storage::in_memory().unwrap();
        let batch = ExpenseService::new(&other)
            .import_csv(out.as_slice(), "expenses.csv", ImportTarget::default())
            .unwrap();
        assert_eq!(batch.inserted_count, 1);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(CsvTable::parse("Quotes"), Some(CsvTable::Quotes));
        assert_eq!(CsvTable::parse("ledger"), None);
        for table in CsvTable::ALL {
            let storage = Storage::in_memory().unwrap();
            let mut out = Vec::new();
            export_table_csv(&storage, table, &mut out).unwrap();
            assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
        }
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
