//! Database schema and migrations
//!
//! The schema version lives in `schema_version`. Each migration step is
//! idempotent and runs inside its own transaction.

use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::EstateResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

const V1: &str = r#"
CREATE TABLE IF NOT EXISTS assets (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    asset_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'operational',
    region TEXT,
    address TEXT,
    land_area_sqm REAL,
    building_area_sqm REAL,
    purchase_price INTEGER,
    current_valuation INTEGER,
    acquisition_date TEXT,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_assets_region ON assets(region);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY,
    asset_id INTEGER REFERENCES assets(id),
    name TEXT NOT NULL,
    code TEXT,
    project_type TEXT,
    status TEXT NOT NULL DEFAULT 'planning',
    budget INTEGER NOT NULL DEFAULT 0,
    actual_cost INTEGER NOT NULL DEFAULT 0,
    contingency INTEGER NOT NULL DEFAULT 0,
    completion_percentage REAL NOT NULL DEFAULT 0
        CHECK (completion_percentage BETWEEN 0 AND 100),
    start_date TEXT,
    expected_completion TEXT,
    actual_start_date TEXT,
    actual_completion_date TEXT,
    description TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_projects_asset ON projects(asset_id);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
    amount INTEGER NOT NULL CHECK (amount > 0),
    category TEXT,
    description TEXT,
    reference TEXT,
    payee TEXT,
    asset_id INTEGER REFERENCES assets(id),
    project_id INTEGER REFERENCES projects(id),
    is_reconciled INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_asset ON transactions(asset_id);
CREATE INDEX IF NOT EXISTS idx_transactions_project ON transactions(project_id);

CREATE TABLE IF NOT EXISTS consultants (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    company TEXT,
    email TEXT,
    phone TEXT,
    category TEXT,
    typical_scopes TEXT NOT NULL DEFAULT '[]',
    quality_rating INTEGER CHECK (quality_rating BETWEEN 1 AND 5),
    reliability_rating INTEGER CHECK (reliability_rating BETWEEN 1 AND 5),
    cost_rating INTEGER CHECK (cost_rating BETWEEN 1 AND 5),
    notes TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY,
    consultant_id INTEGER NOT NULL REFERENCES consultants(id),
    asset_id INTEGER REFERENCES assets(id),
    project_id INTEGER REFERENCES projects(id),
    quote_date TEXT NOT NULL,
    valid_until TEXT,
    amount INTEGER NOT NULL CHECK (amount > 0),
    currency TEXT NOT NULL DEFAULT 'AUD',
    status TEXT NOT NULL DEFAULT 'pending',
    scope TEXT,
    project_type TEXT,
    project_size REAL,
    actual_amount INTEGER,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_quotes_consultant ON quotes(consultant_id);

CREATE TABLE IF NOT EXISTS monthly_expenses (
    id INTEGER PRIMARY KEY,
    asset_id INTEGER REFERENCES assets(id),
    project_id INTEGER REFERENCES projects(id),
    year INTEGER NOT NULL,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    category TEXT NOT NULL,
    amount INTEGER NOT NULL,
    currency TEXT NOT NULL DEFAULT 'AUD',
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_monthly_expenses_key ON monthly_expenses(
    IFNULL(asset_id, 0), IFNULL(project_id, 0), category, year, month
);

CREATE TABLE IF NOT EXISTS project_tasks (
    id INTEGER PRIMARY KEY,
    project_id INTEGER NOT NULL REFERENCES projects(id),
    parent_task_id INTEGER REFERENCES project_tasks(id),
    code TEXT,
    name TEXT NOT NULL,
    description TEXT,
    wbs_level INTEGER NOT NULL DEFAULT 1,
    sort_order INTEGER NOT NULL DEFAULT 0,
    start_date TEXT NOT NULL,
    finish_date TEXT NOT NULL,
    duration_days INTEGER NOT NULL DEFAULT 0,
    actual_start_date TEXT,
    actual_finish_date TEXT,
    predecessors TEXT NOT NULL DEFAULT '',
    dependency_type TEXT NOT NULL DEFAULT 'FS',
    lag_days INTEGER NOT NULL DEFAULT 0,
    completion_percentage REAL NOT NULL DEFAULT 0
        CHECK (completion_percentage BETWEEN 0 AND 100),
    status TEXT NOT NULL DEFAULT 'not_started',
    contractor TEXT,
    estimated_cost INTEGER,
    actual_cost INTEGER,
    is_critical INTEGER NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (finish_date >= start_date)
);
CREATE INDEX IF NOT EXISTS idx_project_tasks_project ON project_tasks(project_id);
"#;

const V2: &str = r#"
CREATE TABLE IF NOT EXISTS market_indicators (
    id INTEGER PRIMARY KEY,
    indicator_type TEXT NOT NULL,
    region TEXT NOT NULL,
    value REAL NOT NULL,
    previous_value REAL,
    change_percent REAL,
    period TEXT,
    date TEXT NOT NULL,
    source TEXT NOT NULL,
    source_url TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_market_indicators_type
    ON market_indicators(indicator_type, region, date);

CREATE TABLE IF NOT EXISTS import_batches (
    batch_id TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    inserted_count INTEGER NOT NULL DEFAULT 0,
    updated_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'success',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS import_records (
    id INTEGER PRIMARY KEY,
    batch_id TEXT NOT NULL REFERENCES import_batches(batch_id),
    expense_id INTEGER NOT NULL,
    action TEXT NOT NULL,
    previous_amount INTEGER
);
CREATE INDEX IF NOT EXISTS idx_import_records_batch ON import_records(batch_id);
"#;

/// Bring the schema up to `SCHEMA_VERSION`
pub fn migrate(conn: &Connection) -> EstateResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);",
    )?;

    let current = current_version(conn)?;
    if current >= SCHEMA_VERSION {
        debug!(version = current, "Schema up to date");
        return Ok(());
    }

    let steps: [(i32, &str); 2] = [(1, V1), (2, V2)];
    for (version, sql) in steps {
        if current < version {
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(sql)?;
            tx.execute("DELETE FROM schema_version", [])?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![version],
            )?;
            tx.commit()?;
            info!(version, "Applied schema migration");
        }
    }

    Ok(())
}

/// Version recorded in the database, 0 for a fresh file
pub fn current_version(conn: &Connection) -> EstateResult<i32> {
    let version: Option<i32> = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                 ('assets', 'projects', 'transactions', 'consultants', 'quotes',
                  'monthly_expenses', 'project_tasks', 'market_indicators',
                  'import_batches', 'import_records')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 10);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_upgrade_from_v1() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE schema_version (version INTEGER NOT NULL);")
            .unwrap();
        conn.execute_batch(V1).unwrap();
        conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])
            .unwrap();

        migrate(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 2);
    }
}
