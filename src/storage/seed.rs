//! Sample portfolio for `estate init --sample`
//!
//! Dates are placed relative to `today` so the finance views have data in
//! the trailing months.

use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use tracing::info;

use crate::error::{EstateError, EstateResult};
use crate::models::{
    Asset, AssetId, AssetStatus, AssetType, Consultant, ConsultantId, Money, MonthlyExpense,
    Project, ProjectId, ProjectStatus, ProjectTask, Quote, QuoteStatus, TaskId, TaskStatus,
    Transaction, TransactionKind, YearMonth,
};

use super::{
    AssetRepository, ConsultantRepository, ExpenseRepository, ProjectRepository, QuoteRepository,
    Storage, TaskRepository, TransactionRepository,
};

/// Row counts written by the seed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub assets: usize,
    pub projects: usize,
    pub transactions: usize,
    pub consultants: usize,
    pub quotes: usize,
    pub expenses: usize,
    pub tasks: usize,
}

/// Write the sample portfolio in one transaction.
///
/// Refuses to run against a database that already holds assets.
pub fn load_sample_data(storage: &Storage, today: NaiveDate) -> EstateResult<SeedSummary> {
    let existing = storage.assets().totals()?.count;
    if existing > 0 {
        return Err(EstateError::Validation(format!(
            "Database already contains {} asset(s); sample data is only loaded into an empty database",
            existing
        )));
    }

    let summary = storage.transaction(|conn| {
        let mut summary = SeedSummary::default();
        let warehouse = seed_brisbane_warehouse(conn, today, &mut summary)?;
        let project = seed_sunshine_coast(conn, today, &mut summary)?;
        seed_acacia_ridge(conn, today, &mut summary)?;
        seed_consultants(conn, today, warehouse, project, &mut summary)?;
        Ok(summary)
    })?;

    info!(?summary, "Loaded sample data");
    Ok(summary)
}

fn days_ago(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(today)
}

fn days_ahead(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_add_days(Days::new(days)).unwrap_or(today)
}

struct LedgerLine<'s> {
    date: NaiveDate,
    kind: TransactionKind,
    dollars: i64,
    category: &'s str,
    description: &'s str,
    payee: &'s str,
    reference: Option<String>,
}

fn record(
    conn: &Connection,
    asset_id: AssetId,
    project_id: Option<ProjectId>,
    line: LedgerLine<'_>,
    summary: &mut SeedSummary,
) -> EstateResult<()> {
    let mut txn = Transaction::new(line.date, line.kind, Money::from_dollars(line.dollars));
    txn.asset_id = Some(asset_id);
    txn.project_id = project_id;
    txn.category = Some(line.category.to_string());
    txn.description = Some(line.description.to_string());
    txn.payee = Some(line.payee.to_string());
    txn.reference = line.reference;
    txn.is_reconciled = true;
    TransactionRepository::new(conn).insert(&txn)?;
    summary.transactions += 1;
    Ok(())
}

fn seed_brisbane_warehouse(
    conn: &Connection,
    today: NaiveDate,
    summary: &mut SeedSummary,
) -> EstateResult<AssetId> {
    let mut asset = Asset::new("Brisbane Logistics Hub", AssetType::Warehouse);
    asset.status = AssetStatus::Leased;
    asset.region = Some("Brisbane".into());
    asset.address = Some("45 Gateway Drive, Eagle Farm QLD 4009".into());
    asset.land_area_sqm = Some(6_000.0);
    asset.building_area_sqm = Some(5_000.0);
    asset.purchase_price = Some(Money::from_dollars(6_500_000));
    asset.current_valuation = Some(Money::from_dollars(7_200_000));
    asset.acquisition_date = Some(days_ago(today, 730));
    asset.notes = "A-grade warehouse, fully leased to XYZ Logistics".into();
    let asset_id = AssetRepository::new(conn).insert(&asset)?;
    summary.assets += 1;

    // One rent payment on the first of each of the last six months
    for month in YearMonth::trailing(6, today) {
        record(
            conn,
            asset_id,
            None,
            LedgerLine {
                date: month.start_date(),
                kind: TransactionKind::Income,
                dollars: 45_000,
                category: "Rental Income",
                description: "Monthly rent - XYZ Logistics",
                payee: "XYZ Logistics Pty Ltd",
                reference: Some(format!("INV-{}-001", month)),
            },
            summary,
        )?;
    }

    let costs = [
        (20, 2_500, "Maintenance", "Roof maintenance and gutter cleaning", "Industrial Maintenance Services"),
        (45, 1_800, "Utilities", "Electricity bill", "Energex"),
        (90, 12_500, "Insurance", "Annual building insurance premium", "QBE Insurance"),
    ];
    for (ago, dollars, category, description, payee) in costs {
        record(
            conn,
            asset_id,
            None,
            LedgerLine {
                date: days_ago(today, ago),
                kind: TransactionKind::Expense,
                dollars,
                category,
                description,
                payee,
                reference: None,
            },
            summary,
        )?;
    }

    let expenses = ExpenseRepository::new(conn);
    for month in YearMonth::trailing(3, today) {
        for (category, dollars) in [("Council Rates", 2_800), ("Insurance", 1_050), ("Cleaning", 650)] {
            let mut expense = MonthlyExpense::new(month, category, Money::from_dollars(dollars));
            expense.asset_id = Some(asset_id);
            expenses.upsert(&expense)?;
            summary.expenses += 1;
        }
    }

    Ok(asset_id)
}

fn seed_sunshine_coast(
    conn: &Connection,
    today: NaiveDate,
    summary: &mut SeedSummary,
) -> EstateResult<ProjectId> {
    let mut land = Asset::new("Sunshine Coast Industrial Estate", AssetType::IndustrialLand);
    land.status = AssetStatus::UnderDevelopment;
    land.region = Some("Sunshine Coast".into());
    land.address = Some("Lot 15 Progress Road, Kawana QLD 4556".into());
    land.land_area_sqm = Some(12_000.0);
    land.purchase_price = Some(Money::from_dollars(3_200_000));
    land.current_valuation = Some(Money::from_dollars(3_500_000));
    land.acquisition_date = Some(days_ago(today, 180));
    land.notes = "4,200 sqm warehouse construction in progress".into();
    let asset_id = AssetRepository::new(conn).insert(&land)?;
    summary.assets += 1;

    let mut project = Project::new("Sunshine Coast Warehouse Construction");
    project.asset_id = Some(asset_id);
    project.code = Some("SC-WH-2024-001".into());
    project.project_type = Some("Warehouse Construction".into());
    project.status = ProjectStatus::Construction;
    project.budget = Money::from_dollars(4_500_000);
    project.actual_cost = Money::from_dollars(1_850_000);
    project.contingency = Money::from_dollars(225_000);
    project.completion_percentage = 35.0;
    project.start_date = Some(days_ago(today, 90));
    project.actual_start_date = Some(days_ago(today, 85));
    project.expected_completion = Some(days_ahead(today, 180));
    project.description = Some("New 4,200 sqm warehouse with 750 kVA power".into());
    let project_id = ProjectRepository::new(conn).insert(&project)?;
    summary.projects += 1;

    let progress_claims = [
        (85, 320_000, "Site preparation and civil works", "PC-001"),
        (70, 450_000, "Foundation and slab construction", "PC-002"),
        (50, 580_000, "Structural steel and roof frame", "PC-003"),
        (30, 320_000, "Wall cladding and insulation", "PC-004"),
        (15, 180_000, "Electrical rough-in and power infrastructure", "PC-005"),
    ];
    for (ago, dollars, description, reference) in progress_claims {
        record(
            conn,
            asset_id,
            Some(project_id),
            LedgerLine {
                date: days_ago(today, ago),
                kind: TransactionKind::Expense,
                dollars,
                category: "Construction",
                description,
                payee: "ABC Construction Pty Ltd",
                reference: Some(reference.to_string()),
            },
            summary,
        )?;
    }

    let fees = [
        (100, 45_000, "Consulting", "Architectural design services", "Design Partners Architecture"),
        (95, 32_000, "Consulting", "Structural engineering services", "Structural Solutions QLD"),
        (110, 15_000, "Legal Fees", "Development approval legal services", "Thompson Legal"),
    ];
    for (ago, dollars, category, description, payee) in fees {
        record(
            conn,
            asset_id,
            Some(project_id),
            LedgerLine {
                date: days_ago(today, ago),
                kind: TransactionKind::Expense,
                dollars,
                category,
                description,
                payee,
                reference: None,
            },
            summary,
        )?;
    }

    seed_tasks(conn, today, project_id, summary)?;
    Ok(project_id)
}

fn seed_tasks(
    conn: &Connection,
    today: NaiveDate,
    project_id: ProjectId,
    summary: &mut SeedSummary,
) -> EstateResult<()> {
    let repo = TaskRepository::new(conn);

    // (code, name, start offset, finish offset, completion, cost, critical)
    let phases: [(&str, &str, i64, i64, f64, i64, bool); 4] = [
        ("1", "Site works", -90, -40, 100.0, 800_000, true),
        ("2", "Structure", -50, 30, 60.0, 1_900_000, true),
        ("3", "Services", 0, 120, 10.0, 900_000, false),
        ("4", "Fit-out and landscaping", 100, 180, 0.0, 600_000, false),
    ];

    let offset = |days: i64| -> NaiveDate {
        if days < 0 {
            days_ago(today, days.unsigned_abs())
        } else {
            days_ahead(today, days.unsigned_abs())
        }
    };

    let mut previous: Option<TaskId> = None;
    for (index, (code, name, start, finish, completion, cost, critical)) in
        phases.into_iter().enumerate()
    {
        let mut task = ProjectTask::new(project_id, name, offset(start), offset(finish));
        task.code = Some(code.to_string());
        task.sort_order = index as i32;
        task.completion_percentage = completion;
        task.status = match completion {
            c if c >= 100.0 => TaskStatus::Completed,
            c if c > 0.0 => TaskStatus::InProgress,
            _ => TaskStatus::NotStarted,
        };
        task.estimated_cost = Some(Money::from_dollars(cost));
        task.is_critical = critical;
        task.contractor = Some("ABC Construction Pty Ltd".into());
        task.predecessors = previous.into_iter().collect();
        let parent = repo.insert(&task)?;
        summary.tasks += 1;
        previous = Some(parent);

        if code == "2" {
            for (sub, sub_name, s, f, pct) in [
                ("2.1", "Slab pour", -50, -30, 100.0),
                ("2.2", "Steel erection", -30, 10, 70.0),
                ("2.3", "Roof and cladding", 0, 30, 20.0),
            ] {
                let mut child = ProjectTask::new(project_id, sub_name, offset(s), offset(f));
                child.code = Some(sub.to_string());
                child.parent_task_id = Some(parent);
                child.wbs_level = 2;
                child.completion_percentage = pct;
                child.is_critical = critical;
                repo.insert(&child)?;
                summary.tasks += 1;
            }
        }
    }

    Ok(())
}

fn seed_acacia_ridge(
    conn: &Connection,
    today: NaiveDate,
    summary: &mut SeedSummary,
) -> EstateResult<()> {
    let mut land = Asset::new("Acacia Ridge Industrial Land", AssetType::IndustrialLand);
    land.status = AssetStatus::Vacant;
    land.region = Some("Brisbane".into());
    land.address = Some("Lot 22 Industry Boulevard, Acacia Ridge QLD 4110".into());
    land.land_area_sqm = Some(15_000.0);
    land.purchase_price = Some(Money::from_dollars(4_200_000));
    land.current_valuation = Some(Money::from_dollars(4_200_000));
    land.acquisition_date = Some(days_ago(today, 60));
    land.notes = "Land held for future warehouse development".into();
    let asset_id = AssetRepository::new(conn).insert(&land)?;
    summary.assets += 1;

    let holding = [
        (30, 8_500, "Council Rates", "Quarterly council rates", "Brisbane City Council"),
        (45, 15_000, "Legal Fees", "Legal fees for land acquisition", "Brisbane Property Lawyers"),
    ];
    for (ago, dollars, category, description, payee) in holding {
        record(
            conn,
            asset_id,
            None,
            LedgerLine {
                date: days_ago(today, ago),
                kind: TransactionKind::Expense,
                dollars,
                category,
                description,
                payee,
                reference: None,
            },
            summary,
        )?;
    }
    Ok(())
}

fn seed_consultants(
    conn: &Connection,
    today: NaiveDate,
    warehouse: AssetId,
    project: ProjectId,
    summary: &mut SeedSummary,
) -> EstateResult<()> {
    let consultants = ConsultantRepository::new(conn);
    let quotes = QuoteRepository::new(conn);

    let people: [(&str, &str, &str, &[&str], [u8; 3]); 3] = [
        (
            "Michael Torres",
            "Structural Solutions QLD",
            "Structural Engineering",
            &["Structural design", "Slab design", "Steel frame certification"],
            [5, 4, 3],
        ),
        (
            "Priya Nair",
            "Coastal Civil Consulting",
            "Civil Engineering",
            &["Stormwater design", "Earthworks", "Pavement design"],
            [4, 5, 4],
        ),
        (
            "David Walsh",
            "Walsh Town Planning",
            "Town Planning",
            &["Development approval", "Planning report"],
            [4, 3, 5],
        ),
    ];

    let mut ids: Vec<ConsultantId> = Vec::new();
    for (name, company, category, scopes, [quality, reliability, cost]) in people {
        let mut consultant = Consultant::new(name);
        consultant.company = Some(company.to_string());
        consultant.category = Some(category.to_string());
        consultant.email = Some(format!(
            "{}@{}.com.au",
            name.split_whitespace().next().unwrap_or(name).to_lowercase(),
            company.split_whitespace().next().unwrap_or(company).to_lowercase()
        ));
        consultant.typical_scopes = scopes.iter().map(|s| s.to_string()).collect();
        consultant.quality_rating = Some(quality);
        consultant.reliability_rating = Some(reliability);
        consultant.cost_rating = Some(cost);
        ids.push(consultants.insert(&consultant)?);
        summary.consultants += 1;
    }

    // Structural quotes scale with building size, which feeds the price estimate
    let structural = [(2_000.0, 28_000, 400), (3_500.0, 41_000, 300), (4_200.0, 47_500, 120)];
    for (size, dollars, ago) in structural {
        let mut quote = Quote::new(ids[0], days_ago(today, ago), Money::from_dollars(dollars));
        quote.project_type = Some("Warehouse Construction".into());
        quote.project_size = Some(size);
        quote.scope = Some("Structural design".into());
        quote.valid_until = Some(days_ago(today, ago.saturating_sub(60)));
        if size >= 4_200.0 {
            quote.project_id = Some(project);
            quote.status = QuoteStatus::Accepted;
        } else {
            quote.status = QuoteStatus::Completed;
            quote.actual_amount = Some(Money::from_dollars(dollars + 1_500));
        }
        quotes.insert(&quote)?;
        summary.quotes += 1;
    }

    let mut civil = Quote::new(ids[1], days_ago(today, 20), Money::from_dollars(36_000));
    civil.project_id = Some(project);
    civil.project_type = Some("Warehouse Construction".into());
    civil.project_size = Some(4_200.0);
    civil.scope = Some("Stormwater design".into());
    civil.valid_until = Some(days_ahead(today, 40));
    quotes.insert(&civil)?;
    summary.quotes += 1;

    let mut planning = Quote::new(ids[2], days_ago(today, 10), Money::from_dollars(12_000));
    planning.asset_id = Some(warehouse);
    planning.scope = Some("Planning report".into());
    planning.valid_until = Some(days_ahead(today, 50));
    quotes.insert(&planning)?;
    summary.quotes += 1;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::AssetFilter;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn test_load_sample_data() {
        let storage = Storage::in_memory().unwrap();
        let summary = load_sample_data(&storage, today()).unwrap();

        assert_eq!(summary.assets, 3);
        assert_eq!(summary.projects, 1);
        assert_eq!(summary.consultants, 3);
        assert_eq!(summary.tasks, 7);
        assert_eq!(
            storage.assets().list(&AssetFilter::default()).unwrap().len(),
            3
        );
        assert_eq!(
            storage.transactions().count().unwrap(),
            summary.transactions as i64
        );
    }

    #[test]
    fn test_refuses_non_empty_database() {
        let storage = Storage::in_memory().unwrap();
        load_sample_data(&storage, today()).unwrap();
        let err = load_sample_data(&storage, today()).unwrap_err();
        assert!(err.is_validation());
    }
}
