//! Backup restoration for estate
//!
//! A backup is checked before it replaces the live database: it must open as
//! SQLite, pass `PRAGMA integrity_check`, and carry a schema version this
//! build understands.

use std::fs;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::config::paths::EstatePaths;
use crate::error::{EstateError, EstateResult};
use crate::storage::schema::{self, SCHEMA_VERSION};

/// Handles restoring from backups
pub struct RestoreManager {
    paths: EstatePaths,
}

impl RestoreManager {
    pub fn new(paths: EstatePaths) -> Self {
        Self { paths }
    }

    /// Inspect a backup file without restoring it
    pub fn validate_backup(&self, backup_path: &Path) -> EstateResult<ValidationResult> {
        if !backup_path.is_file() {
            return Err(EstateError::NotFound {
                entity_type: "Backup",
                identifier: backup_path.display().to_string(),
            });
        }

        let conn = Connection::open_with_flags(backup_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        let integrity: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| EstateError::Storage(format!("Not a readable database: {}", e)))?;
        let schema_version = schema::current_version(&conn)
            .map_err(|e| EstateError::Storage(format!("Backup has no schema version: {}", e)))?;

        let mut missing = Vec::new();
        let mut count = |table: &'static str| -> EstateResult<i64> {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [table],
                |row| row.get(0),
            )?;
            if !exists {
                missing.push(table);
                return Ok(0);
            }
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?)
        };
        let asset_count = count("assets")?;
        let project_count = count("projects")?;
        let transaction_count = count("transactions")?;

        let (integrity_ok, integrity_message) = if missing.is_empty() {
            (integrity == "ok", integrity)
        } else {
            warn!(path = %backup_path.display(), ?missing, "Backup is missing tables");
            (false, format!("missing table(s): {}", missing.join(", ")))
        };

        Ok(ValidationResult {
            integrity_ok,
            integrity_message,
            schema_version,
            asset_count,
            project_count,
            transaction_count,
        })
    }

    /// Replace the live database with `backup_path`
    ///
    /// The caller must have closed its own connection first. Any WAL files
    /// left by that connection are removed so they cannot be replayed onto
    /// the restored copy.
    pub fn restore_from_file(&self, backup_path: &Path) -> EstateResult<ValidationResult> {
        let validation = self.validate_backup(backup_path)?;
        if !validation.integrity_ok {
            return Err(EstateError::Integrity(format!(
                "Backup failed integrity check: {}",
                validation.integrity_message
            )));
        }
        if validation.schema_version == 0 || validation.schema_version > SCHEMA_VERSION {
            return Err(EstateError::Validation(format!(
                "Backup schema version {} is not supported (expected 1-{})",
                validation.schema_version, SCHEMA_VERSION
            )));
        }

        self.paths.ensure_directories()?;
        let db_path = self.paths.database_file();
        for suffix in ["-wal", "-shm"] {
            let side = db_path.with_file_name(format!(
                "{}{}",
                db_path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
                suffix
            ));
            if side.exists() {
                if let Err(e) = fs::remove_file(&side) {
                    warn!(path = %side.display(), error = %e, "Could not remove WAL file");
                }
            }
        }

        fs::copy(backup_path, &db_path)
            .map_err(|e| EstateError::Io(format!("Failed to restore database: {}", e)))?;

        info!(from = %backup_path.display(), "Restored database");
        Ok(validation)
    }
}

/// Result of validating a backup
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub integrity_ok: bool,
    /// Raw `integrity_check` output
    pub integrity_message: String,
    pub schema_version: i32,
    pub asset_count: i64,
    pub project_count: i64,
    pub transaction_count: i64,
}

impl ValidationResult {
    pub fn summary(&self) -> String {
        if self.integrity_ok {
            format!(
                "Valid backup (schema v{}): {} assets, {} projects, {} transactions",
                self.schema_version, self.asset_count, self.project_count, self.transaction_count
            )
        } else {
            format!("Corrupt backup: {}", self.integrity_message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::manager::BackupManager;
    use crate::config::settings::BackupRetention;
    use crate::models::{Asset, AssetType};
    use crate::services::AssetService;
    use crate::storage::Storage;
    use tempfile::TempDir;

    fn create_test_env() -> (EstatePaths, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = EstatePaths::with_base_dir(temp_dir.path().to_path_buf());
        (paths, temp_dir)
    }

    #[test]
    fn test_backup_and_restore() {
        let (paths, _temp) = create_test_env();
        let backups = BackupManager::new(paths.backup_dir(), BackupRetention::default());

        let backup_path = {
            let storage = Storage::open(paths.clone()).unwrap();
            AssetService::new(&storage)
                .create(Asset::new("Brisbane Logistics Hub", AssetType::Warehouse))
                .unwrap();
            let path = backups.create_backup(&storage).unwrap();

            AssetService::new(&storage)
                .create(Asset::new("Later Asset", AssetType::IndustrialLand))
                .unwrap();
            path
        };

        let restore = RestoreManager::new(paths.clone());
        let result = restore.restore_from_file(&backup_path).unwrap();
        assert!(result.integrity_ok);
        assert_eq!(result.asset_count, 1);
        assert_eq!(result.schema_version, SCHEMA_VERSION);

        let storage = Storage::open(paths).unwrap();
        let names: Vec<String> = AssetService::new(&storage)
            .list(&Default::default())
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Brisbane Logistics Hub".to_string()]);
    }

    #[test]
    fn test_rejects_non_database() {
        let (paths, temp) = create_test_env();
        let bogus = temp.path().join("backup-20250101-000000.db");
        fs::write(&bogus, b"this is not sqlite").unwrap();

        let restore = RestoreManager::new(paths);
        assert!(restore.restore_from_file(&bogus).is_err());
    }

    #[test]
    fn test_rejects_newer_schema() {
        let (paths, temp) = create_test_env();
        let future = temp.path().join("future.db");
        {
            let conn = Connection::open(&future).unwrap();
            conn.execute_batch(
                "CREATE TABLE schema_version (version INTEGER NOT NULL);
                 INSERT INTO schema_version (version) VALUES (99);",
            )
            .unwrap();
        }

        let err = RestoreManager::new(paths).restore_from_file(&future).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_missing_tables_make_backup_invalid() {
        let (paths, temp) = create_test_env();
        let hollow = temp.path().join("hollow.db");
        {
            let conn = Connection::open(&hollow).unwrap();
            conn.execute_batch(
                "CREATE TABLE schema_version (version INTEGER NOT NULL);
                 INSERT INTO schema_version (version) VALUES (1);
                 CREATE TABLE assets (id INTEGER PRIMARY KEY);
                 INSERT INTO assets (id) VALUES (1);",
            )
            .unwrap();
        }

        let restore = RestoreManager::new(paths.clone());
        let result = restore.validate_backup(&hollow).unwrap();
        assert!(!result.integrity_ok);
        assert_eq!(result.asset_count, 1);
        assert_eq!(
            result.integrity_message,
            "missing table(s): projects, transactions"
        );
        assert!(result.summary().starts_with("Corrupt backup"));

        let err = restore.restore_from_file(&hollow).unwrap_err();
        assert!(matches!(err, EstateError::Integrity(_)));
        assert!(!paths.database_file().exists());
    }

    #[test]
    fn test_missing_file() {
        let (paths, temp) = create_test_env();
        let err = RestoreManager::new(paths)
            .validate_backup(&temp.path().join("missing.db"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_summary() {
        let result = ValidationResult {
            integrity_ok: true,
            integrity_message: "ok".into(),
            schema_version: 2,
            asset_count: 3,
            project_count: 1,
            transaction_count: 10,
        };
        assert!(result.summary().contains("3 assets"));
    }
}
