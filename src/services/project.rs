//! Project service
//!
//! Project CRUD, portfolio-level project totals and per-project cost
//! rollups combining every table that can carry project costs.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{EstateError, EstateResult};
use crate::models::{Money, Project, ProjectId};
use crate::storage::projects::ProjectCostSources;
use crate::storage::{ProjectFilter, ProjectRepository, Storage};

pub struct ProjectService<'a> {
    storage: &'a Storage,
}

/// Budget position of one project
#[derive(Debug, Clone)]
pub struct CostRollup {
    pub project: Project,
    pub sources: ProjectCostSources,
    /// Budget minus recorded actual cost; negative when over budget
    pub variance: Money,
    /// Recorded actual cost as a percentage of budget; 0 with no budget
    pub percent_used: f64,
    /// Contingency left after absorbing any overrun, floored at zero
    pub contingency_remaining: Money,
}

impl CostRollup {
    pub fn from_sources(project: Project, sources: ProjectCostSources) -> Self {
        let variance = project.budget - project.actual_cost;
        let percent_used = if project.budget.is_positive() {
            project.actual_cost.as_f64() / project.budget.as_f64() * 100.0
        } else {
            0.0
        };
        let overrun = if variance.is_negative() {
            variance.abs()
        } else {
            Money::zero()
        };
        let remaining = project.contingency - overrun;
        let contingency_remaining = if remaining.is_negative() {
            Money::zero()
        } else {
            remaining
        };

        Self {
            project,
            sources,
            variance,
            percent_used,
            contingency_remaining,
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.variance.is_negative()
    }
}

/// Rollups for every project plus column totals
#[derive(Debug, Clone)]
pub struct BudgetReport {
    pub rows: Vec<CostRollup>,
    pub total_budget: Money,
    pub total_actual: Money,
    pub total_variance: Money,
    pub total_contingency: Money,
}

impl<'a> ProjectService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, mut project: Project) -> EstateResult<Project> {
        project.name = project.name.trim().to_string();
        project
            .validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;
        self.check_unique(&project)?;

        project.id = self.storage.projects().insert(&project)?;
        info!(id = %project.id, name = %project.name, "Created project");

        self.storage.log_create(
            EntityType::Project,
            project.id.to_string(),
            Some(project.name.clone()),
            &project,
        )?;

        Ok(project)
    }

    fn check_unique(&self, project: &Project) -> EstateResult<()> {
        let mut keys = vec![project.name.as_str()];
        if let Some(code) = project.code.as_deref() {
            keys.push(code);
        }
        for key in keys {
            if let Some(existing) = self.storage.projects().get_by_name(key)? {
                if existing.id != project.id {
                    return Err(EstateError::Duplicate {
                        entity_type: "Project",
                        identifier: key.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: ProjectId) -> EstateResult<Option<Project>> {
        self.storage.projects().get(id)
    }

    /// Find a project by name, code or ID string
    pub fn find(&self, identifier: &str) -> EstateResult<Option<Project>> {
        if let Some(project) = self.storage.projects().get_by_name(identifier)? {
            return Ok(Some(project));
        }

        if let Ok(id) = identifier.parse::<ProjectId>() {
            return self.storage.projects().get(id);
        }

        Ok(None)
    }

    pub fn require(&self, identifier: &str) -> EstateResult<Project> {
        self.find(identifier)?
            .ok_or_else(|| EstateError::project_not_found(identifier))
    }

    pub fn list(&self, filter: &ProjectFilter) -> EstateResult<Vec<Project>> {
        debug!(?filter, "Listing projects");
        self.storage.projects().list(filter)
    }

    pub fn update(&self, mut project: Project) -> EstateResult<Project> {
        let before = self
            .get(project.id)?
            .ok_or_else(|| EstateError::project_not_found(project.id.to_string()))?;

        project.name = project.name.trim().to_string();
        project
            .validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;
        self.check_unique(&project)?;

        project.updated_at = Utc::now();
        self.storage.projects().update(&project)?;

        self.storage.log_update(
            EntityType::Project,
            project.id.to_string(),
            Some(project.name.clone()),
            &before,
            &project,
        )?;

        Ok(project)
    }

    /// Delete a project. Its tasks go with it; transactions, quotes and
    /// monthly expenses stay but lose the project link.
    pub fn delete(&self, id: ProjectId) -> EstateResult<Project> {
        let project = self
            .get(id)?
            .ok_or_else(|| EstateError::project_not_found(id.to_string()))?;

        self.storage
            .transaction(|conn| ProjectRepository::new(conn).delete_detaching(id))?;
        info!(id = %id, name = %project.name, "Deleted project");

        self.storage.log_delete(
            EntityType::Project,
            id.to_string(),
            Some(project.name.clone()),
            &project,
        )?;

        Ok(project)
    }

    /// Projects in Planning, Under Review or Construction
    pub fn active_projects_count(&self) -> EstateResult<i64> {
        self.storage.projects().active_count()
    }

    pub fn total_budget(&self) -> EstateResult<Money> {
        self.storage.projects().total_budget()
    }

    pub fn total_actual_cost(&self) -> EstateResult<Money> {
        self.storage.projects().total_actual_cost()
    }

    pub fn average_completion(&self) -> EstateResult<f64> {
        self.storage.projects().average_completion()
    }

    pub fn cost_rollup(&self, id: ProjectId) -> EstateResult<CostRollup> {
        let project = self
            .get(id)?
            .ok_or_else(|| EstateError::project_not_found(id.to_string()))?;
        let sources = self.storage.projects().cost_sources(id)?;
        Ok(CostRollup::from_sources(project, sources))
    }

    pub fn budget_report(&self, filter: &ProjectFilter) -> EstateResult<BudgetReport> {
        let projects = self.list(filter)?;
        let mut rows = Vec::with_capacity(projects.len());
        for project in projects {
            let sources = self.storage.projects().cost_sources(project.id)?;
            rows.push(CostRollup::from_sources(project, sources));
        }

        Ok(BudgetReport {
            total_budget: rows.iter().map(|r| r.project.budget).sum(),
            total_actual: rows.iter().map(|r| r.project.actual_cost).sum(),
            total_variance: rows.iter().map(|r| r.variance).sum(),
            total_contingency: rows.iter().map(|r| r.project.contingency).sum(),
            rows,
        })
    }

    /// Completion estimated from the project's dates as of `today`
    pub fn timeline_completion(&self, id: ProjectId, today: NaiveDate) -> EstateResult<f64> {
        let project = self
            .get(id)?
            .ok_or_else(|| EstateError::project_not_found(id.to_string()))?;
        Ok(project.timeline_completion(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectStatus, ProjectTask, Quote, QuoteStatus, Transaction, TransactionKind};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(name: &str, budget: i64, actual: i64, contingency: i64) -> Project {
        let mut project = Project::new(name);
        project.budget = Money::from_dollars(budget);
        project.actual_cost = Money::from_dollars(actual);
        project.contingency = Money::from_dollars(contingency);
        project
    }

    #[test]
    fn test_create_find_by_code() {
        let storage = Storage::in_memory().unwrap();
        let service = ProjectService::new(&storage);
        let mut p = project("Warehouse Stage 1", 100, 0, 0);
        p.code = Some("SC-WH-1".into());
        let created = service.create(p).unwrap();

        assert_eq!(service.require("sc-wh-1").unwrap().id, created.id);
        assert_eq!(service.require(&created.id.to_string()).unwrap().id, created.id);
        assert!(service.require("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_name_or_code() {
        let storage = Storage::in_memory().unwrap();
        let service = ProjectService::new(&storage);
        let mut p = project("A", 1, 0, 0);
        p.code = Some("X1".into());
        service.create(p).unwrap();

        assert!(matches!(
            service.create(project("a", 1, 0, 0)),
            Err(EstateError::Duplicate { .. })
        ));
        let mut other = project("B", 1, 0, 0);
        other.code = Some("x1".into());
        assert!(matches!(service.create(other), Err(EstateError::Duplicate { .. })));
    }

    #[test]
    fn test_invalid_completion_rejected() {
        let storage = Storage::in_memory().unwrap();
        let mut p = project("A", 1, 0, 0);
        p.completion_percentage = 120.0;
        assert!(ProjectService::new(&storage).create(p).unwrap_err().is_validation());
    }

    #[test]
    fn test_rollup_under_budget() {
        let rollup = CostRollup::from_sources(project("A", 1_000, 400, 100), Default::default());
        assert_eq!(rollup.variance, Money::from_dollars(600));
        assert!((rollup.percent_used - 40.0).abs() < 1e-9);
        assert_eq!(rollup.contingency_remaining, Money::from_dollars(100));
        assert!(!rollup.is_over_budget());
    }

    #[test]
    fn test_rollup_overrun_eats_contingency() {
        let rollup = CostRollup::from_sources(project("A", 1_000, 1_060, 100), Default::default());
        assert_eq!(rollup.variance, Money::from_dollars(-60));
        assert_eq!(rollup.contingency_remaining, Money::from_dollars(40));
        assert!(rollup.is_over_budget());

        let blown = CostRollup::from_sources(project("B", 1_000, 1_500, 100), Default::default());
        assert_eq!(blown.contingency_remaining, Money::zero());
    }

    #[test]
    fn test_rollup_zero_budget() {
        let rollup = CostRollup::from_sources(project("A", 0, 50, 0), Default::default());
        assert_eq!(rollup.percent_used, 0.0);
    }

    #[test]
    fn test_cost_rollup_collects_sources() {
        let storage = Storage::in_memory().unwrap();
        let service = ProjectService::new(&storage);
        let p = service.create(project("A", 10_000, 0, 0)).unwrap();

        let mut txn = Transaction::new(date(2025, 1, 1), TransactionKind::Expense, Money::from_dollars(300));
        txn.project_id = Some(p.id);
        storage.transactions().insert(&txn).unwrap();
        let mut income = Transaction::new(date(2025, 1, 1), TransactionKind::Income, Money::from_dollars(999));
        income.project_id = Some(p.id);
        storage.transactions().insert(&income).unwrap();

        let consultant = storage
            .consultants()
            .insert(&crate::models::Consultant::new("C"))
            .unwrap();
        let mut accepted = Quote::new(consultant, date(2025, 1, 1), Money::from_dollars(2_000));
        accepted.project_id = Some(p.id);
        accepted.status = QuoteStatus::Accepted;
        storage.quotes().insert(&accepted).unwrap();
        let mut pending = Quote::new(consultant, date(2025, 1, 1), Money::from_dollars(5_000));
        pending.project_id = Some(p.id);
        storage.quotes().insert(&pending).unwrap();

        let mut task = ProjectTask::new(p.id, "Slab", date(2025, 1, 1), date(2025, 1, 10));
        task.estimated_cost = Some(Money::from_dollars(700));
        task.actual_cost = Some(Money::from_dollars(650));
        storage.tasks().insert(&task).unwrap();

        let rollup = service.cost_rollup(p.id).unwrap();
        assert_eq!(rollup.sources.transactions, Money::from_dollars(300));
        assert_eq!(rollup.sources.committed_quotes, Money::from_dollars(2_000));
        assert_eq!(rollup.sources.task_estimated, Money::from_dollars(700));
        assert_eq!(rollup.sources.task_actual, Money::from_dollars(650));
    }

    #[test]
    fn test_delete_detaches_transactions_and_removes_tasks() {
        let storage = Storage::in_memory().unwrap();
        let service = ProjectService::new(&storage);
        let p = service.create(project("A", 1, 0, 0)).unwrap();

        let mut txn = Transaction::new(date(2025, 1, 1), TransactionKind::Expense, Money::from_dollars(3));
        txn.project_id = Some(p.id);
        let txn_id = storage.transactions().insert(&txn).unwrap();
        storage
            .tasks()
            .insert(&ProjectTask::new(p.id, "T", date(2025, 1, 1), date(2025, 1, 2)))
            .unwrap();

        service.delete(p.id).unwrap();
        assert!(service.get(p.id).unwrap().is_none());
        let kept = storage.transactions().get(txn_id).unwrap().unwrap();
        assert!(kept.project_id.is_none());
        assert!(storage.tasks().list(p.id, None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_folds_expense_into_asset_level_row() {
        use crate::models::{Asset, AssetType, MonthlyExpense, YearMonth};
        use crate::storage::ExpenseFilter;

        let storage = Storage::in_memory().unwrap();
        let asset_id = storage
            .assets()
            .insert(&Asset::new("Hub", AssetType::Warehouse))
            .unwrap();
        let mut p = project("Fitout", 1, 0, 0);
        p.asset_id = Some(asset_id);
        let p = ProjectService::new(&storage).create(p).unwrap();

        let jan = YearMonth::new(2025, 1).unwrap();
        let expense = |category: &str, dollars: i64, project_id: Option<ProjectId>| {
            let mut e = MonthlyExpense::new(jan, category, Money::from_dollars(dollars));
            e.asset_id = Some(asset_id);
            e.project_id = project_id;
            e
        };
        storage.expenses().upsert(&expense("Rates", 100, None)).unwrap();
        storage.expenses().upsert(&expense("Rates", 40, Some(p.id))).unwrap();
        storage.expenses().upsert(&expense("Insurance", 10, Some(p.id))).unwrap();

        ProjectService::new(&storage).delete(p.id).unwrap();

        let rows = storage.expenses().list(&ExpenseFilter::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|e| e.project_id.is_none()));
        let rates = rows.iter().find(|e| e.category == "Rates").unwrap();
        assert_eq!(rates.amount, Money::from_dollars(140));
        let insurance = rows.iter().find(|e| e.category == "Insurance").unwrap();
        assert_eq!(insurance.amount, Money::from_dollars(10));
    }

    #[test]
    fn test_budget_report_totals() {
        let storage = Storage::in_memory().unwrap();
        let service = ProjectService::new(&storage);
        service.create(project("A", 1_000, 400, 50)).unwrap();
        let mut b = project("B", 500, 700, 100);
        b.status = ProjectStatus::Construction;
        service.create(b).unwrap();

        let report = service.budget_report(&ProjectFilter::default()).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.total_budget, Money::from_dollars(1_500));
        assert_eq!(report.total_actual, Money::from_dollars(1_100));
        assert_eq!(report.total_variance, Money::from_dollars(400));
        assert_eq!(report.total_contingency, Money::from_dollars(150));
        assert_eq!(service.active_projects_count().unwrap(), 2);
    }

    #[test]
    fn test_timeline_completion() {
        let storage = Storage::in_memory().unwrap();
        let service = ProjectService::new(&storage);
        let mut p = project("A", 1, 0, 0);
        p.start_date = Some(date(2025, 1, 1));
        p.expected_completion = Some(date(2025, 1, 11));
        let p = service.create(p).unwrap();

        assert!((service.timeline_completion(p.id, date(2025, 1, 6)).unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(service.timeline_completion(p.id, date(2025, 2, 1)).unwrap(), 100.0);
        assert_eq!(service.timeline_completion(p.id, date(2024, 12, 1)).unwrap(), 0.0);

        let undated = service.create(project("B", 1, 0, 0)).unwrap();
        assert_eq!(service.timeline_completion(undated.id, date(2025, 1, 6)).unwrap(), 0.0);
    }
}
