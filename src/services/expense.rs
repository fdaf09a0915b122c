//! Monthly expense service
//!
//! Upserts keyed by (asset, project, category, year, month), monthly and
//! category totals, and CSV import in undoable batches.

use std::io::Read;

use chrono::Utc;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::EntityType;
use crate::error::{EstateError, EstateResult};
use crate::models::{
    AssetId, ExpenseId, ImportAction, ImportBatch, ImportRecord, ImportStatus, Money,
    MonthlyExpense, ProjectId, YearMonth,
};
use crate::storage::{ExpenseFilter, ExpenseRepository, ImportRepository, Storage};

pub struct ExpenseService<'a> {
    storage: &'a Storage,
}

/// One row of an expense CSV: `year,month,category,amount[,notes]`
#[derive(Debug, Deserialize)]
struct CsvRow {
    year: i32,
    month: u32,
    category: String,
    amount: String,
    #[serde(default)]
    notes: Option<String>,
}

/// Where imported rows are attached
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportTarget {
    pub asset_id: Option<AssetId>,
    pub project_id: Option<ProjectId>,
}

impl<'a> ExpenseService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Insert an expense, or update the amount if its key already exists
    pub fn upsert(&self, mut expense: MonthlyExpense) -> EstateResult<(MonthlyExpense, ImportAction)> {
        expense.category = expense.category.trim().to_string();
        expense
            .validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;

        let before = self.storage.expenses().find_by_key(&expense)?;
        let write = self.storage.expenses().upsert(&expense)?;
        let saved = self
            .get(write.id)?
            .ok_or_else(|| EstateError::expense_not_found(write.id.to_string()))?;
        info!(id = %saved.id, action = %write.action, category = %saved.category, "Saved monthly expense");

        let name = Some(format!("{} {}-{:02}", saved.category, saved.year, saved.month));
        match before {
            Some(before) => self.storage.log_update(
                EntityType::MonthlyExpense,
                saved.id.to_string(),
                name,
                &before,
                &saved,
            )?,
            None => self.storage.log_create(
                EntityType::MonthlyExpense,
                saved.id.to_string(),
                name,
                &saved,
            )?,
        }

        Ok((saved, write.action))
    }

    pub fn get(&self, id: ExpenseId) -> EstateResult<Option<MonthlyExpense>> {
        self.storage.expenses().get(id)
    }

    pub fn list(&self, filter: &ExpenseFilter) -> EstateResult<Vec<MonthlyExpense>> {
        debug!(?filter, "Listing monthly expenses");
        self.storage.expenses().list(filter)
    }

    pub fn delete(&self, id: ExpenseId) -> EstateResult<MonthlyExpense> {
        let expense = self
            .get(id)?
            .ok_or_else(|| EstateError::expense_not_found(id.to_string()))?;
        self.storage.expenses().delete(id)?;
        info!(id = %id, "Deleted monthly expense");

        self.storage.log_delete(
            EntityType::MonthlyExpense,
            id.to_string(),
            Some(expense.category.clone()),
            &expense,
        )?;
        Ok(expense)
    }

    /// Total per month for all twelve months of `year`
    pub fn totals_by_month(
        &self,
        year: i32,
        asset_id: Option<AssetId>,
    ) -> EstateResult<Vec<(YearMonth, Money)>> {
        let totals = self.storage.expenses().totals_by_month(year, asset_id)?;
        Ok(YearMonth::year_months(year)
            .into_iter()
            .map(|period| {
                let total = totals
                    .iter()
                    .find(|(month, _)| *month == period.month())
                    .map(|(_, amount)| *amount)
                    .unwrap_or_else(Money::zero);
                (period, total)
            })
            .collect())
    }

    /// Totals per category over `from..=to`, largest first
    pub fn totals_by_category(
        &self,
        from: YearMonth,
        to: YearMonth,
    ) -> EstateResult<Vec<(String, Money)>> {
        if from > to {
            return Err(EstateError::Validation(format!(
                "Start month {} is after end month {}",
                from, to
            )));
        }
        self.storage.expenses().totals_by_category(from, to)
    }

    /// Import expenses from CSV.
    ///
    /// Every row is parsed and validated before anything is written; a bad
    /// row rejects the whole file. Rows are then upserted in one SQL
    /// transaction and recorded against a new batch so `undo_batch` can
    /// reverse them.
    pub fn import_csv<R: Read>(
        &self,
        reader: R,
        file_name: &str,
        target: ImportTarget,
    ) -> EstateResult<ImportBatch> {
        let expenses = parse_csv(reader, target)?;
        if expenses.is_empty() {
            return Err(EstateError::Import(format!("{} contains no rows", file_name)));
        }

        let batch_id = Uuid::new_v4();
        let batch = self.storage.transaction(|conn| {
            let expense_repo = ExpenseRepository::new(conn);
            let import_repo = ImportRepository::new(conn);

            let mut batch = ImportBatch {
                batch_id,
                file_name: file_name.to_string(),
                inserted_count: 0,
                updated_count: 0,
                status: ImportStatus::Success,
                created_at: Utc::now(),
            };
            import_repo.insert_batch(&batch)?;

            for expense in &expenses {
                let write = expense_repo.upsert(expense)?;
                match write.action {
                    ImportAction::Inserted => batch.inserted_count += 1,
                    ImportAction::Updated => batch.updated_count += 1,
                }
                import_repo.insert_record(&ImportRecord {
                    batch_id,
                    expense_id: write.id,
                    action: write.action,
                    previous_amount: write.previous_amount,
                })?;
            }

            import_repo.set_counts(batch_id, batch.inserted_count, batch.updated_count)?;
            Ok(batch)
        })?;

        info!(
            batch = %batch.batch_id,
            inserted = batch.inserted_count,
            updated = batch.updated_count,
            "Imported monthly expenses"
        );
        self.storage.log_create(
            EntityType::ImportBatch,
            batch.batch_id.to_string(),
            Some(batch.file_name.clone()),
            &batch,
        )?;

        Ok(batch)
    }

    /// Reverse an import: inserted rows are deleted and updated rows get
    /// their previous amount back.
    pub fn undo_batch(&self, batch_id: Uuid) -> EstateResult<ImportBatch> {
        let before = self
            .storage
            .imports()
            .get_batch(batch_id)?
            .ok_or_else(|| EstateError::NotFound {
                entity_type: "Import batch",
                identifier: batch_id.to_string(),
            })?;

        if before.status == ImportStatus::Undone {
            return Err(EstateError::Validation(format!(
                "Import batch {} has already been undone",
                batch_id
            )));
        }

        self.storage.transaction(|conn| {
            let expense_repo = ExpenseRepository::new(conn);
            let import_repo = ImportRepository::new(conn);

            // Newest first, so a key written twice in one file ends at its
            // pre-import value
            let mut records = import_repo.records(batch_id)?;
            records.reverse();
            for record in records {
                let applied = match (record.action, record.previous_amount) {
                    (ImportAction::Inserted, _) => expense_repo.delete(record.expense_id)?,
                    (ImportAction::Updated, Some(previous)) => {
                        expense_repo.set_amount(record.expense_id, previous)?
                    }
                    (ImportAction::Updated, None) => false,
                };
                if !applied {
                    warn!(expense = %record.expense_id, "Import record no longer applies");
                }
            }

            import_repo.set_status(batch_id, ImportStatus::Undone)?;
            Ok(())
        })?;

        let after = ImportBatch {
            status: ImportStatus::Undone,
            ..before.clone()
        };
        info!(batch = %batch_id, "Undid import batch");
        self.storage.log_update(
            EntityType::ImportBatch,
            batch_id.to_string(),
            Some(after.file_name.clone()),
            &before,
            &after,
        )?;

        Ok(after)
    }

    pub fn list_batches(&self) -> EstateResult<Vec<ImportBatch>> {
        self.storage.imports().list_batches()
    }
}

fn parse_csv<R: Read>(reader: R, target: ImportTarget) -> EstateResult<Vec<MonthlyExpense>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut expenses = Vec::new();
    for (idx, result) in csv_reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1
        let line = idx + 2;
        let row = result.map_err(|e| EstateError::Import(format!("Line {}: {}", line, e)))?;

        let period = YearMonth::new(row.year, row.month).ok_or_else(|| {
            EstateError::Import(format!("Line {}: month must be 1-12, got {}", line, row.month))
        })?;
        let amount = Money::parse(&row.amount)
            .map_err(|e| EstateError::Import(format!("Line {}: {}", line, e)))?;

        let mut expense = MonthlyExpense::new(period, row.category.trim(), amount);
        expense.asset_id = target.asset_id;
        expense.project_id = target.project_id;
        expense.notes = row.notes.unwrap_or_default();
        expense
            .validate()
            .map_err(|e| EstateError::Import(format!("Line {}: {}", line, e)))?;

        expenses.push(expense);
    }

    Ok(expenses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Asset, AssetType};

    fn month(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn setup() -> (Storage, AssetId) {
        let storage = Storage::in_memory().unwrap();
        let asset_id = storage
            .assets()
            .insert(&Asset::new("Hub", AssetType::Warehouse))
            .unwrap();
        (storage, asset_id)
    }

    fn expense(asset_id: AssetId, m: u32, category: &str, dollars: i64) -> MonthlyExpense {
        let mut e = MonthlyExpense::new(month(2025, m), category, Money::from_dollars(dollars));
        e.asset_id = Some(asset_id);
        e
    }

    #[test]
    fn test_upsert_updates_same_key() {
        let (storage, asset_id) = setup();
        let service = ExpenseService::new(&storage);

        let (first, action) = service.upsert(expense(asset_id, 3, "Rates", 100)).unwrap();
        assert_eq!(action, ImportAction::Inserted);
        let (second, action) = service.upsert(expense(asset_id, 3, "Rates", 150)).unwrap();
        assert_eq!(action, ImportAction::Updated);
        assert_eq!(first.id, second.id);
        assert_eq!(second.amount, Money::from_dollars(150));

        // Different category is a different key
        service.upsert(expense(asset_id, 3, "Insurance", 20)).unwrap();
        assert_eq!(service.list(&ExpenseFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_upsert_without_asset_uses_null_key() {
        let storage = Storage::in_memory().unwrap();
        let service = ExpenseService::new(&storage);
        let e = MonthlyExpense::new(month(2025, 1), "Admin", Money::from_dollars(1));
        service.upsert(e.clone()).unwrap();
        let (_, action) = service.upsert(e).unwrap();
        assert_eq!(action, ImportAction::Updated);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let (storage, asset_id) = setup();
        let err = ExpenseService::new(&storage)
            .upsert(expense(asset_id, 1, "Rates", -5))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_totals_by_month_fills_year() {
        let (storage, asset_id) = setup();
        let service = ExpenseService::new(&storage);
        service.upsert(expense(asset_id, 2, "Rates", 100)).unwrap();
        service.upsert(expense(asset_id, 2, "Insurance", 50)).unwrap();
        service.upsert(expense(asset_id, 7, "Rates", 10)).unwrap();

        let totals = service.totals_by_month(2025, None).unwrap();
        assert_eq!(totals.len(), 12);
        assert_eq!(totals[1].1, Money::from_dollars(150));
        assert_eq!(totals[6].1, Money::from_dollars(10));
        assert_eq!(totals[0].1, Money::zero());
    }

    #[test]
    fn test_totals_by_category() {
        let (storage, asset_id) = setup();
        let service = ExpenseService::new(&storage);
        service.upsert(expense(asset_id, 1, "Rates", 100)).unwrap();
        service.upsert(expense(asset_id, 2, "Rates", 100)).unwrap();
        service.upsert(expense(asset_id, 2, "Insurance", 300)).unwrap();
        service.upsert(expense(asset_id, 5, "Insurance", 999)).unwrap();

        let totals = service.totals_by_category(month(2025, 1), month(2025, 3)).unwrap();
        assert_eq!(totals[0], ("Insurance".to_string(), Money::from_dollars(300)));
        assert_eq!(totals[1], ("Rates".to_string(), Money::from_dollars(200)));
        assert!(service
            .totals_by_category(month(2025, 3), month(2025, 1))
            .unwrap_err()
            .is_validation());
    }

    const CSV: &str = "year,month,category,amount,notes\n\
        2025,1,Rates,\"$1,200.00\",Q1 rates\n\
        2025,1,Insurance,300\n\
        2025,2,Rates,1200\n";

    #[test]
    fn test_import_and_undo() {
        let (storage, asset_id) = setup();
        let service = ExpenseService::new(&storage);
        service.upsert(expense(asset_id, 2, "Rates", 999)).unwrap();

        let target = ImportTarget {
            asset_id: Some(asset_id),
            project_id: None,
        };
        let batch = service.import_csv(CSV.as_bytes(), "rates.csv", target).unwrap();
        assert_eq!(batch.inserted_count, 2);
        assert_eq!(batch.updated_count, 1);

        let stored = storage.imports().get_batch(batch.batch_id).unwrap().unwrap();
        assert_eq!(stored.inserted_count, 2);

        let all = service.list(&ExpenseFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|e| e.notes == "Q1 rates" && e.amount == Money::from_dollars(1_200)));

        let undone = service.undo_batch(batch.batch_id).unwrap();
        assert_eq!(undone.status, ImportStatus::Undone);

        let remaining = service.list(&ExpenseFilter::default()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].amount, Money::from_dollars(999));

        assert!(service.undo_batch(batch.batch_id).unwrap_err().is_validation());
    }

    #[test]
    fn test_undo_restores_key_written_twice() {
        let (storage, asset_id) = setup();
        let service = ExpenseService::new(&storage);
        service.upsert(expense(asset_id, 4, "Rates", 10)).unwrap();

        let csv = "year,month,category,amount\n2025,4,Rates,20\n2025,4,Rates,30\n";
        let target = ImportTarget {
            asset_id: Some(asset_id),
            project_id: None,
        };
        let batch = service.import_csv(csv.as_bytes(), "twice.csv", target).unwrap();
        assert_eq!(batch.updated_count, 2);

        service.undo_batch(batch.batch_id).unwrap();
        let rows = service.list(&ExpenseFilter::default()).unwrap();
        assert_eq!(rows[0].amount, Money::from_dollars(10));
    }

    #[test]
    fn test_bad_row_rejects_whole_file() {
        let (storage, _) = setup();
        let service = ExpenseService::new(&storage);
        let csv = "year,month,category,amount\n2025,1,Rates,10\n2025,13,Rates,10\n";

        let err = service
            .import_csv(csv.as_bytes(), "bad.csv", ImportTarget::default())
            .unwrap_err();
        assert!(matches!(err, EstateError::Import(ref msg) if msg.contains("Line 3")));
        assert!(service.list(&ExpenseFilter::default()).unwrap().is_empty());
        assert!(service.list_batches().unwrap().is_empty());
    }

    #[test]
    fn test_empty_file_rejected() {
        let (storage, _) = setup();
        let err = ExpenseService::new(&storage)
            .import_csv("year,month,category,amount\n".as_bytes(), "e.csv", ImportTarget::default())
            .unwrap_err();
        assert!(matches!(err, EstateError::Import(_)));
    }

    #[test]
    fn test_unknown_batch() {
        let (storage, _) = setup();
        let err = ExpenseService::new(&storage)
            .undo_batch(Uuid::new_v4())
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
