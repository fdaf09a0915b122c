use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const BIN_NAME: &str = "estate";

fn estate(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
    cmd.env("ESTATE_DATA_DIR", dir);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn initialized() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    estate(dir.path()).arg("init").assert().success();
    dir
}

#[test]
fn init_creates_settings_and_database() {
    let dir = TempDir::new().unwrap();
    estate(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Initialization complete!"));

    assert!(dir.path().join("config.json").exists());
    assert!(dir.path().join("data").join("estate.db").exists());
    estate(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(contains("Initialized:      true"));
}

#[test]
fn init_sample_loads_portfolio_once() {
    let dir = TempDir::new().unwrap();
    estate(dir.path())
        .args(["init", "--sample"])
        .assert()
        .success()
        .stdout(contains("Sample portfolio loaded"));

    estate(dir.path())
        .args(["asset", "list"])
        .assert()
        .success()
        .stdout(contains("Brisbane Logistics Hub"));

    estate(dir.path())
        .args(["init", "--sample"])
        .assert()
        .failure();
}

#[test]
fn asset_create_then_list() {
    let dir = initialized();
    estate(dir.path())
        .args([
            "asset",
            "create",
            "Eagle Farm Cold Store",
            "-t",
            "cold_storage",
            "-r",
            "Brisbane",
            "--valuation",
            "12500000",
        ])
        .assert()
        .success()
        .stdout(contains("Created asset: Eagle Farm Cold Store"));

    estate(dir.path())
        .args(["asset", "list", "--region", "Brisbane"])
        .assert()
        .success()
        .stdout(contains("Eagle Farm Cold Store").and(contains("$12,500,000.00")));
}

#[test]
fn asset_create_rejects_unknown_type() {
    let dir = initialized();
    estate(dir.path())
        .args(["asset", "create", "Somewhere", "-t", "castle"])
        .assert()
        .failure()
        .stderr(contains("Invalid asset type"));
}

#[test]
fn asset_delete_with_dependants_needs_force() {
    let dir = initialized();
    estate(dir.path())
        .args(["asset", "create", "Wacol Depot"])
        .assert()
        .success();
    estate(dir.path())
        .args(["txn", "add", "income", "4000", "-d", "2025-03-01", "-a", "Wacol Depot"])
        .assert()
        .success();

    estate(dir.path())
        .args(["asset", "delete", "Wacol Depot"])
        .assert()
        .failure()
        .stderr(contains("--force"));

    estate(dir.path())
        .args(["asset", "delete", "Wacol Depot", "--force"])
        .assert()
        .success()
        .stdout(contains("Deleted asset: Wacol Depot"));
}

#[test]
fn transactions_feed_the_monthly_view() {
    let dir = initialized();
    estate(dir.path())
        .args(["txn", "add", "income", "10000", "-d", "2025-02-03", "-c", "Rent"])
        .assert()
        .success()
        .stdout(contains("Recorded income of $10,000.00"));
    estate(dir.path())
        .args(["transaction", "add", "expense", "2500.50", "-d", "2025-02-20", "-c", "Rates"])
        .assert()
        .success();

    estate(dir.path())
        .args(["finance", "month", "2025-02"])
        .assert()
        .success()
        .stdout(
            contains("$10,000.00")
                .and(contains("$2,500.50"))
                .and(contains("$7,499.50")),
        );
}

#[test]
fn configured_currency_and_date_format_are_shown() {
    let dir = initialized();
    let config = dir.path().join("config.json");
    let mut settings: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config).unwrap()).unwrap();
    settings["currency_symbol"] = "A$".into();
    settings["date_format"] = "%d/%m/%Y".into();
    std::fs::write(&config, settings.to_string()).unwrap();

    estate(dir.path())
        .args(["txn", "add", "income", "10000", "-d", "2025-02-03", "-c", "Rent"])
        .assert()
        .success()
        .stdout(contains("A$10,000.00"));

    estate(dir.path())
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(contains("03/02/2025").and(contains("A$10,000.00")));
}

#[test]
fn expense_import_and_undo() {
    let dir = initialized();
    let csv_path = dir.path().join("expenses.csv");
    std::fs::write(
        &csv_path,
        "year,month,category,amount,notes\n2025,1,Rates,1200.00,Q1\n2025,2,Insurance,800,\n",
    )
    .unwrap();

    let output = estate(dir.path())
        .args(["expense", "import"])
        .arg(&csv_path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("2 inserted, 0 updated"));
    let batch = stdout
        .lines()
        .find_map(|l| l.strip_prefix("Batch: "))
        .expect("batch id printed")
        .trim()
        .to_string();

    estate(dir.path())
        .args(["expense", "list", "--year", "2025"])
        .assert()
        .success()
        .stdout(contains("Rates").and(contains("Insurance")));

    estate(dir.path())
        .args(["expense", "undo", &batch])
        .assert()
        .success()
        .stdout(contains("2 inserted row(s) removed"));

    estate(dir.path())
        .args(["expense", "list", "--year", "2025"])
        .assert()
        .success()
        .stdout(contains("Rates").not());
}

#[test]
fn expense_import_reports_bad_line() {
    let dir = initialized();
    let csv_path = dir.path().join("bad.csv");
    std::fs::write(
        &csv_path,
        "year,month,category,amount\n2025,1,Rates,100\n2025,13,Rates,100\n",
    )
    .unwrap();

    estate(dir.path())
        .args(["expense", "import"])
        .arg(&csv_path)
        .assert()
        .failure()
        .stderr(contains("Line 3"));
}

#[test]
fn loan_prints_summary_without_database() {
    let dir = TempDir::new().unwrap();
    estate(dir.path())
        .args(["loan", "investment", "1000000"])
        .assert()
        .success()
        .stdout(
            contains("Loan Amount:")
                .and(contains("$600,000.00"))
                .and(contains("$3,375.00")),
        );
}

#[test]
fn loan_rejects_lvr_over_100() {
    let dir = TempDir::new().unwrap();
    estate(dir.path())
        .args(["loan", "investment", "1000000", "--lvr", "120"])
        .assert()
        .failure();
}

#[test]
fn loan_rejects_absurd_term() {
    let dir = TempDir::new().unwrap();
    estate(dir.path())
        .args(["loan", "investment", "1000000", "--term", "400000000"])
        .assert()
        .failure()
        .stderr(contains("cannot exceed 50 years"));
}

#[test]
fn construction_loan_prints_draw_schedule() {
    let dir = TempDir::new().unwrap();
    estate(dir.path())
        .args([
            "loan",
            "construction",
            "2000000",
            "--months",
            "4",
            "--profile",
            "linear",
            "--schedule",
        ])
        .assert()
        .success()
        .stdout(
            contains("Construction Loan")
                .and(contains("$1,300,000.00"))
                .and(contains("$325,000.00"))
                .and(contains("Outstanding")),
        );

    estate(dir.path())
        .args(["loan", "construction", "2000000", "--draws", "1,-1"])
        .assert()
        .failure()
        .stderr(contains("Draw weights"));
}

#[test]
fn refinance_reports_equity_release() {
    let dir = TempDir::new().unwrap();
    estate(dir.path())
        .args([
            "loan",
            "dual",
            "8500000",
            "10200000",
            "--months",
            "14",
            "--noi",
            "650000",
        ])
        .assert()
        .success()
        .stdout(
            contains("Refinance Feasible")
                .and(contains("$6,120,000.00"))
                .and(contains("Equity Release"))
                .and(contains("DSCR")),
        );
}

#[test]
fn cashflow_rejects_huge_window() {
    let dir = initialized();
    estate(dir.path())
        .args(["finance", "cashflow", "--months", "4000000000"])
        .assert()
        .failure()
        .stderr(contains("1-120 months"));
}

#[test]
fn backup_create_then_list() {
    let dir = initialized();
    estate(dir.path())
        .args(["backup", "create"])
        .assert()
        .success()
        .stdout(contains("Backup created:"));

    estate(dir.path())
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(contains("Total: 1 backup(s)"));

    estate(dir.path())
        .args(["backup", "validate", "latest"])
        .assert()
        .success()
        .stdout(contains("Integrity:"));
}

#[test]
fn export_all_json_is_valid() {
    let dir = TempDir::new().unwrap();
    estate(dir.path())
        .args(["init", "--sample"])
        .assert()
        .success();

    let out = dir.path().join("portfolio.json");
    estate(dir.path())
        .args(["export", "all"])
        .arg(&out)
        .arg("--pretty")
        .assert()
        .success();

    let contents = std::fs::read_to_string(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert!(value["assets"].as_array().map_or(false, |a| !a.is_empty()));

    estate(dir.path())
        .args(["export", "verify"])
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("Export file is valid"));
}

#[test]
fn audit_shows_created_asset() {
    let dir = initialized();
    estate(dir.path())
        .args(["asset", "create", "Yatala Plant", "-t", "manufacturing"])
        .assert()
        .success();

    estate(dir.path())
        .args(["audit", "--entity", "asset"])
        .assert()
        .success()
        .stdout(contains("Yatala Plant"));
}

#[test]
fn unknown_asset_is_not_found() {
    let dir = initialized();
    estate(dir.path())
        .args(["asset", "show", "Nowhere"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}
