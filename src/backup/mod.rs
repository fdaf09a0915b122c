//! Backup system for estate
//!
//! Rolling copies of the SQLite database with a configurable retention
//! policy, and a restore path that validates a copy before using it.
//!
//! # Backup Format
//!
//! Each backup is a complete SQLite file produced by `VACUUM INTO`, named
//! `backup-YYYYMMDD-HHMMSS-mmm.db`.
//!
//! # Retention Policy
//!
//! By default, the system keeps:
//! - 30 daily backups
//! - 12 monthly backups (the first backup of each month)
//!
//! # Example
//!
//! ```rust,ignore
//! use estate::backup::{BackupManager, RestoreManager};
//! use estate::config::{paths::EstatePaths, settings::BackupRetention};
//!
//! let paths = EstatePaths::new()?;
//! let manager = BackupManager::new(paths.backup_dir(), BackupRetention::default());
//! let (backup_path, _) = manager.create_backup_with_retention(&storage)?;
//!
//! drop(storage);
//! let result = RestoreManager::new(paths).restore_from_file(&backup_path)?;
//! println!("{}", result.summary());
//! ```

mod manager;
mod restore;

pub use manager::{BackupInfo, BackupManager};
pub use restore::{RestoreManager, ValidationResult};
