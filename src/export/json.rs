//! JSON Export functionality
//!
//! Exports the complete database to JSON format with schema versioning.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EstateError, EstateResult};
use crate::models::{
    Asset, AssetId, Consultant, MonthlyExpense, Project, ProjectId, ProjectTask, Quote, Transaction,
};
use crate::storage::{AssetFilter, ExpenseFilter, ProjectFilter, Storage, TransactionFilter};

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full database export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub assets: Vec<Asset>,
    pub projects: Vec<Project>,
    pub transactions: Vec<Transaction>,
    pub consultants: Vec<Consultant>,
    pub quotes: Vec<Quote>,
    pub monthly_expenses: Vec<MonthlyExpense>,
    pub tasks: Vec<ProjectTask>,

    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub asset_count: usize,
    pub project_count: usize,
    pub transaction_count: usize,
    pub consultant_count: usize,
    pub quote_count: usize,
    pub expense_count: usize,
    pub task_count: usize,

    /// Date range of transactions (earliest)
    pub earliest_transaction: Option<String>,

    /// Date range of transactions (latest)
    pub latest_transaction: Option<String>,
}

impl FullExport {
    /// Snapshot every table
    pub fn from_storage(storage: &Storage) -> EstateResult<Self> {
        let assets = storage.assets().list(&AssetFilter::default())?;
        let projects = storage.projects().list(&ProjectFilter::default())?;
        let transactions = storage.transactions().list(&TransactionFilter::default())?;
        let consultants = storage.consultants().list(None, false)?;
        let quotes = storage.quotes().all()?;
        let monthly_expenses = storage.expenses().list(&ExpenseFilter::default())?;
        let tasks = storage.tasks().all()?;

        let metadata = ExportMetadata {
            asset_count: assets.len(),
            project_count: projects.len(),
            transaction_count: transactions.len(),
            consultant_count: consultants.len(),
            quote_count: quotes.len(),
            expense_count: monthly_expenses.len(),
            task_count: tasks.len(),
            earliest_transaction: transactions.iter().map(|t| t.date).min().map(|d| d.to_string()),
            latest_transaction: transactions.iter().map(|t| t.date).max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            assets,
            projects,
            transactions,
            consultants,
            quotes,
            monthly_expenses,
            tasks,
            metadata,
        })
    }

    /// Check the schema version and that every reference resolves
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let asset_ids: HashSet<_> = self.assets.iter().map(|a| a.id).collect();
        let project_ids: HashSet<_> = self.projects.iter().map(|p| p.id).collect();
        let consultant_ids: HashSet<_> = self.consultants.iter().map(|c| c.id).collect();

        let check_asset = |owner: String, id: Option<AssetId>| match id {
            Some(id) if !asset_ids.contains(&id) => {
                Err(format!("{} references unknown asset {}", owner, id))
            }
            _ => Ok(()),
        };
        let check_project = |owner: String, id: Option<ProjectId>| match id {
            Some(id) if !project_ids.contains(&id) => {
                Err(format!("{} references unknown project {}", owner, id))
            }
            _ => Ok(()),
        };

        for project in &self.projects {
            check_asset(format!("Project {}", project.id), project.asset_id)?;
        }
        for txn in &self.transactions {
            check_asset(format!("Transaction {}", txn.id), txn.asset_id)?;
            check_project(format!("Transaction {}", txn.id), txn.project_id)?;
        }
        for quote in &self.quotes {
            if !consultant_ids.contains(&quote.consultant_id) {
                return Err(format!(
                    "Quote {} references unknown consultant {}",
                    quote.id, quote.consultant_id
                ));
            }
            check_asset(format!("Quote {}", quote.id), quote.asset_id)?;
            check_project(format!("Quote {}", quote.id), quote.project_id)?;
        }
        for expense in &self.monthly_expenses {
            check_asset(format!("Expense {}", expense.id), expense.asset_id)?;
            check_project(format!("Expense {}", expense.id), expense.project_id)?;
        }
        for task in &self.tasks {
            check_project(format!("Task {}", task.id), Some(task.project_id))?;
        }

        Ok(())
    }
}

/// Export the full database to JSON
pub fn export_full_json<W: Write>(storage: &Storage, writer: &mut W, pretty: bool) -> EstateResult<()> {
    let export = FullExport::from_storage(storage)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| EstateError::Export(e.to_string()))?;

    Ok(())
}

/// Parse and validate a JSON export
pub fn import_from_json(json_str: &str) -> EstateResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json_str).map_err(|e| EstateError::Import(e.to_string()))?;
    export.validate().map_err(EstateError::Import)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetType, Money, TransactionKind};
    use crate::services::{AssetService, TransactionService};
    use chrono::NaiveDate;

    fn seeded() -> Storage {
        let storage = Storage::in_memory().unwrap();
        let asset = AssetService::new(&storage)
            .create(Asset::new("Brisbane Logistics Hub", AssetType::Warehouse))
            .unwrap();

        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            TransactionKind::Income,
            Money::from_dollars(8_000),
        );
        txn.asset_id = Some(asset.id);
        TransactionService::new(&storage).add(txn).unwrap();
        storage
    }

    #[test]
    fn test_full_export() {
        let storage = seeded();
        let export = FullExport::from_storage(&storage).unwrap();

        assert_eq!(export.schema_version, EXPORT_SCHEMA_VERSION);
        assert_eq!(export.metadata.asset_count, 1);
        assert_eq!(export.metadata.transaction_count, 1);
        assert_eq!(export.metadata.earliest_transaction.as_deref(), Some("2025-01-15"));
        assert!(export.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let storage = seeded();
        let mut out = Vec::new();
        export_full_json(&storage, &mut out, true).unwrap();

        let imported = import_from_json(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(imported.assets[0].name, "Brisbane Logistics Hub");
        assert_eq!(imported.transactions[0].amount, Money::from_dollars(8_000));
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let storage = seeded();
        let mut export = FullExport::from_storage(&storage).unwrap();
        export.transactions[0].asset_id = Some(AssetId::new(999));

        let err = export.validate().unwrap_err();
        assert!(err.contains("unknown asset"));
    }

    #[test]
    fn test_version_mismatch() {
        let storage = seeded();
        let mut export = FullExport::from_storage(&storage).unwrap();
        export.schema_version = "0.1.0".into();
        assert!(export.validate().is_err());
    }
}
