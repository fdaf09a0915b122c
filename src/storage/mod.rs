//! Storage layer for estate
//!
//! A single SQLite connection with one repository per table. Repositories
//! borrow the connection, so they also work against an open transaction.

pub mod assets;
pub mod consultants;
pub mod expenses;
pub mod market;
pub mod projects;
pub mod quotes;
pub mod schema;
pub mod seed;
pub mod tasks;
pub mod transactions;

pub use assets::{AssetFilter, AssetRepository};
pub use consultants::ConsultantRepository;
pub use expenses::{ExpenseFilter, ExpenseRepository, ImportRepository};
pub use market::MarketRepository;
pub use projects::{ProjectFilter, ProjectRepository};
pub use quotes::{QuoteHistoryRow, QuoteRepository};
pub use tasks::TaskRepository;
pub use transactions::{TransactionFilter, TransactionRepository};

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::EstatePaths;
use crate::error::{EstateError, EstateResult};

/// Owns the database connection and the audit log
pub struct Storage {
    conn: Connection,
    paths: Option<EstatePaths>,
    audit: Option<AuditLogger>,
}

impl Storage {
    /// Open (creating if needed) the database under `paths` and migrate it
    pub fn open(paths: EstatePaths) -> EstateResult<Self> {
        paths.ensure_directories()?;

        let db_path = paths.database_file();
        debug!(path = %db_path.display(), "Opening database");
        let conn = Connection::open(&db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")?;
        schema::migrate(&conn)?;

        Ok(Self {
            conn,
            audit: Some(AuditLogger::new(paths.audit_log())),
            paths: Some(paths),
        })
    }

    /// A throwaway database with no audit log
    pub fn in_memory() -> EstateResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::migrate(&conn)?;

        Ok(Self {
            conn,
            paths: None,
            audit: None,
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn paths(&self) -> Option<&EstatePaths> {
        self.paths.as_ref()
    }

    /// Paths of a file-backed store; errors for an in-memory one
    pub fn require_paths(&self) -> EstateResult<&EstatePaths> {
        self.paths
            .as_ref()
            .ok_or_else(|| EstateError::Storage("In-memory storage has no data directory".into()))
    }

    pub fn audit_logger(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    /// Run `f` inside a SQL transaction, committing only if it returns `Ok`
    pub fn transaction<T, F>(&self, f: F) -> EstateResult<T>
    where
        F: FnOnce(&Connection) -> EstateResult<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn schema_version(&self) -> EstateResult<i32> {
        schema::current_version(&self.conn)
    }

    pub fn assets(&self) -> AssetRepository<'_> {
        AssetRepository::new(&self.conn)
    }

    pub fn projects(&self) -> ProjectRepository<'_> {
        ProjectRepository::new(&self.conn)
    }

    pub fn transactions(&self) -> TransactionRepository<'_> {
        TransactionRepository::new(&self.conn)
    }

    pub fn consultants(&self) -> ConsultantRepository<'_> {
        ConsultantRepository::new(&self.conn)
    }

    pub fn quotes(&self) -> QuoteRepository<'_> {
        QuoteRepository::new(&self.conn)
    }

    pub fn expenses(&self) -> ExpenseRepository<'_> {
        ExpenseRepository::new(&self.conn)
    }

    pub fn imports(&self) -> ImportRepository<'_> {
        ImportRepository::new(&self.conn)
    }

    pub fn tasks(&self) -> TaskRepository<'_> {
        TaskRepository::new(&self.conn)
    }

    pub fn market(&self) -> MarketRepository<'_> {
        MarketRepository::new(&self.conn)
    }

    /// Log a create operation to the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> EstateResult<()> {
        self.write_audit(|| AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Log an update operation to the audit log
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> EstateResult<()> {
        self.write_audit(|| AuditEntry::update(entity_type, entity_id, entity_name, before, after))
    }

    /// Log a delete operation to the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> EstateResult<()> {
        self.write_audit(|| AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }

    fn write_audit(&self, entry: impl FnOnce() -> AuditEntry) -> EstateResult<()> {
        match &self.audit {
            Some(logger) => logger.log(&entry()),
            None => Ok(()),
        }
    }
}

/// Append `AND column = ?` when the filter value is set
pub(crate) fn push_filter<T: rusqlite::ToSql + 'static>(
    sql: &mut String,
    params: &mut Vec<Box<dyn rusqlite::ToSql>>,
    clause: &str,
    value: Option<T>,
) {
    if let Some(value) = value {
        sql.push_str(" AND ");
        sql.push_str(clause);
        params.push(Box::new(value));
    }
}
