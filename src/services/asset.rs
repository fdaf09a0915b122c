//! Asset service
//!
//! CRUD for properties plus the portfolio-level summaries shown on the
//! assets view.

use chrono::Utc;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{EstateError, EstateResult};
use crate::models::{Asset, AssetId, AssetStatus, AssetType, Money};
use crate::storage::assets::AssetDependants;
use crate::storage::{AssetFilter, AssetRepository, Storage};

pub struct AssetService<'a> {
    storage: &'a Storage,
}

/// Portfolio-wide figures
#[derive(Debug, Clone)]
pub struct PortfolioSummary {
    pub asset_count: i64,
    pub total_valuation: Money,
    pub total_land_area_sqm: f64,
    pub total_building_area_sqm: f64,
    pub by_status: Vec<(AssetStatus, i64)>,
}

/// Distinct values present in the asset table, for building filters
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub types: Vec<AssetType>,
    pub statuses: Vec<AssetStatus>,
}

impl<'a> AssetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Validate and insert a new asset
    pub fn create(&self, mut asset: Asset) -> EstateResult<Asset> {
        asset.name = asset.name.trim().to_string();
        asset
            .validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;

        if self.storage.assets().name_exists(&asset.name, None)? {
            return Err(EstateError::Duplicate {
                entity_type: "Asset",
                identifier: asset.name.clone(),
            });
        }

        asset.id = self.storage.assets().insert(&asset)?;
        info!(id = %asset.id, name = %asset.name, "Created asset");

        self.storage.log_create(
            EntityType::Asset,
            asset.id.to_string(),
            Some(asset.name.clone()),
            &asset,
        )?;

        Ok(asset)
    }

    pub fn get(&self, id: AssetId) -> EstateResult<Option<Asset>> {
        self.storage.assets().get(id)
    }

    /// Find an asset by name or ID string
    pub fn find(&self, identifier: &str) -> EstateResult<Option<Asset>> {
        if let Some(asset) = self.storage.assets().get_by_name(identifier)? {
            return Ok(Some(asset));
        }

        if let Ok(id) = identifier.parse::<AssetId>() {
            return self.storage.assets().get(id);
        }

        Ok(None)
    }

    /// Like `find`, but a missing asset is an error
    pub fn require(&self, identifier: &str) -> EstateResult<Asset> {
        self.find(identifier)?
            .ok_or_else(|| EstateError::asset_not_found(identifier))
    }

    pub fn list(&self, filter: &AssetFilter) -> EstateResult<Vec<Asset>> {
        debug!(?filter, "Listing assets");
        self.storage.assets().list(filter)
    }

    /// Save changes to an existing asset
    pub fn update(&self, mut asset: Asset) -> EstateResult<Asset> {
        let before = self
            .storage
            .assets()
            .get(asset.id)?
            .ok_or_else(|| EstateError::asset_not_found(asset.id.to_string()))?;

        asset.name = asset.name.trim().to_string();
        asset
            .validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;

        if self.storage.assets().name_exists(&asset.name, Some(asset.id))? {
            return Err(EstateError::Duplicate {
                entity_type: "Asset",
                identifier: asset.name.clone(),
            });
        }

        asset.updated_at = Utc::now();
        self.storage.assets().update(&asset)?;

        self.storage.log_update(
            EntityType::Asset,
            asset.id.to_string(),
            Some(asset.name.clone()),
            &before,
            &asset,
        )?;

        Ok(asset)
    }

    /// Delete an asset.
    ///
    /// Without `force` the delete is refused while projects, transactions,
    /// quotes or monthly expenses still reference the asset. With `force`
    /// those rows are removed in the same SQL transaction.
    pub fn delete(&self, id: AssetId, force: bool) -> EstateResult<(Asset, AssetDependants)> {
        let asset = self
            .storage
            .assets()
            .get(id)?
            .ok_or_else(|| EstateError::asset_not_found(id.to_string()))?;

        let dependants = self.storage.assets().dependants(id)?;
        if dependants.total() > 0 && !force {
            return Err(EstateError::Integrity(format!(
                "Asset '{}' still has {} project(s), {} transaction(s), {} quote(s) and {} monthly expense(s); use --force to delete them too",
                asset.name,
                dependants.projects,
                dependants.transactions,
                dependants.quotes,
                dependants.expenses
            )));
        }

        self.storage
            .transaction(|conn| AssetRepository::new(conn).delete_cascade(id))?;
        info!(id = %id, name = %asset.name, cascaded = dependants.total(), "Deleted asset");

        self.storage.log_delete(
            EntityType::Asset,
            id.to_string(),
            Some(asset.name.clone()),
            &asset,
        )?;

        Ok((asset, dependants))
    }

    pub fn portfolio_summary(&self) -> EstateResult<PortfolioSummary> {
        let repo = self.storage.assets();
        let totals = repo.totals()?;
        Ok(PortfolioSummary {
            asset_count: totals.count,
            total_valuation: totals.total_valuation,
            total_land_area_sqm: totals.land_area_sqm,
            total_building_area_sqm: totals.building_area_sqm,
            by_status: repo.count_by_status()?,
        })
    }

    pub fn filter_options(&self) -> EstateResult<FilterOptions> {
        let repo = self.storage.assets();
        Ok(FilterOptions {
            regions: repo.distinct_regions()?,
            types: repo.distinct_types()?,
            statuses: repo.distinct_statuses()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonthlyExpense, Project, Quote, Transaction, TransactionKind, YearMonth};
    use chrono::NaiveDate;

    fn warehouse(name: &str) -> Asset {
        let mut asset = Asset::new(name, AssetType::Warehouse);
        asset.region = Some("Brisbane".into());
        asset.current_valuation = Some(Money::from_dollars(7_200_000));
        asset
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_create_and_find() {
        let storage = Storage::in_memory().unwrap();
        let service = AssetService::new(&storage);

        let created = service.create(warehouse("  Brisbane Hub ")).unwrap();
        assert_eq!(created.name, "Brisbane Hub");
        assert!(!created.id.is_unsaved());

        assert_eq!(service.find("brisbane hub").unwrap().unwrap().id, created.id);
        assert_eq!(
            service.find(&created.id.to_string()).unwrap().unwrap().id,
            created.id
        );
        assert!(service.find("Nowhere").unwrap().is_none());
        assert!(service.require("Nowhere").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let storage = Storage::in_memory().unwrap();
        let service = AssetService::new(&storage);
        service.create(warehouse("Hub")).unwrap();
        assert!(matches!(
            service.create(warehouse("HUB")),
            Err(EstateError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let storage = Storage::in_memory().unwrap();
        let err = AssetService::new(&storage).create(warehouse("   ")).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update() {
        let storage = Storage::in_memory().unwrap();
        let service = AssetService::new(&storage);
        let mut asset = service.create(warehouse("Hub")).unwrap();
        asset.status = AssetStatus::Leased;
        service.update(asset.clone()).unwrap();
        assert_eq!(
            service.get(asset.id).unwrap().unwrap().status,
            AssetStatus::Leased
        );
    }

    #[test]
    fn test_delete_without_dependants() {
        let storage = Storage::in_memory().unwrap();
        let service = AssetService::new(&storage);
        let asset = service.create(warehouse("Hub")).unwrap();
        let (_, dependants) = service.delete(asset.id, false).unwrap();
        assert_eq!(dependants.total(), 0);
        assert!(service.get(asset.id).unwrap().is_none());
    }

    fn asset_with_dependants(storage: &Storage) -> AssetId {
        let asset = AssetService::new(storage).create(warehouse("Hub")).unwrap();

        let mut project = Project::new("Stage 1");
        project.asset_id = Some(asset.id);
        let project_id = storage.projects().insert(&project).unwrap();

        let mut txn = Transaction::new(date(), TransactionKind::Expense, Money::from_dollars(10));
        txn.asset_id = Some(asset.id);
        txn.project_id = Some(project_id);
        storage.transactions().insert(&txn).unwrap();

        let consultant_id = storage
            .consultants()
            .insert(&crate::models::Consultant::new("C"))
            .unwrap();
        let mut quote = Quote::new(consultant_id, date(), Money::from_dollars(5));
        quote.project_id = Some(project_id);
        storage.quotes().insert(&quote).unwrap();

        let mut expense = MonthlyExpense::new(
            YearMonth::new(2025, 3).unwrap(),
            "Rates",
            Money::from_dollars(3),
        );
        expense.asset_id = Some(asset.id);
        storage.expenses().upsert(&expense).unwrap();

        asset.id
    }

    #[test]
    fn test_delete_refused_with_dependants() {
        let storage = Storage::in_memory().unwrap();
        let id = asset_with_dependants(&storage);

        let err = AssetService::new(&storage).delete(id, false).unwrap_err();
        assert!(err.is_integrity());
        assert!(storage.assets().get(id).unwrap().is_some());
        assert_eq!(storage.transactions().count().unwrap(), 1);
    }

    #[test]
    fn test_force_delete_cascades() {
        let storage = Storage::in_memory().unwrap();
        let id = asset_with_dependants(&storage);

        let (_, dependants) = AssetService::new(&storage).delete(id, true).unwrap();
        assert_eq!(dependants.projects, 1);
        assert_eq!(dependants.transactions, 1);
        assert_eq!(dependants.expenses, 1);

        assert!(storage.assets().get(id).unwrap().is_none());
        assert_eq!(storage.transactions().count().unwrap(), 0);
        assert!(storage
            .projects()
            .list(&Default::default())
            .unwrap()
            .is_empty());
        // The quote referenced only the project, so it survives detached
        let history = storage.quotes().history(None, None).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].project_name.is_none());
    }

    #[test]
    fn test_force_delete_with_project_expense_on_same_key() {
        use crate::storage::ExpenseFilter;

        let storage = Storage::in_memory().unwrap();
        let id = asset_with_dependants(&storage);
        let project_id = storage.projects().list(&Default::default()).unwrap()[0].id;

        // Same key as the asset-level Rates row, but tagged to the project
        let mut tagged = MonthlyExpense::new(
            YearMonth::new(2025, 3).unwrap(),
            "Rates",
            Money::from_dollars(7),
        );
        tagged.asset_id = Some(id);
        tagged.project_id = Some(project_id);
        storage.expenses().upsert(&tagged).unwrap();

        // Project-only row, kept once the project is gone
        let mut project_only = MonthlyExpense::new(
            YearMonth::new(2025, 4).unwrap(),
            "Insurance",
            Money::from_dollars(2),
        );
        project_only.project_id = Some(project_id);
        storage.expenses().upsert(&project_only).unwrap();

        AssetService::new(&storage).delete(id, true).unwrap();

        assert!(storage.assets().get(id).unwrap().is_none());
        let left = storage.expenses().list(&ExpenseFilter::default()).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].category, "Insurance");
        assert!(left[0].project_id.is_none());
        assert!(left[0].asset_id.is_none());
    }

    #[test]
    fn test_portfolio_summary_and_filters() {
        let storage = Storage::in_memory().unwrap();
        let service = AssetService::new(&storage);
        service.create(warehouse("A")).unwrap();
        let mut cold = warehouse("B");
        cold.asset_type = AssetType::ColdStorage;
        cold.region = Some("Sydney".into());
        cold.status = AssetStatus::Vacant;
        service.create(cold).unwrap();

        let summary = service.portfolio_summary().unwrap();
        assert_eq!(summary.asset_count, 2);
        assert_eq!(summary.total_valuation, Money::from_dollars(14_400_000));
        assert_eq!(summary.by_status.len(), 2);

        let options = service.filter_options().unwrap();
        assert_eq!(options.regions, vec!["Brisbane", "Sydney"]);
        assert_eq!(options.types.len(), 2);
    }
}
