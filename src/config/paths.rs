//! Path management for the estate tracker
//!
//! ## Path Resolution Order
//!
//! 1. `ESTATE_DATA_DIR` environment variable (if set)
//! 2. The platform config directory from `directories::ProjectDirs`
//!    (`~/.config/estate` on Linux, `~/Library/Application Support/...` on macOS,
//!    `%APPDATA%\...` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::EstateError;

/// Manages all paths used by the estate tracker
#[derive(Debug, Clone)]
pub struct EstatePaths {
    /// Base directory for all estate data
    base_dir: PathBuf,
}

impl EstatePaths {
    /// Create a new EstatePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and
    /// `ESTATE_DATA_DIR` is not set.
    pub fn new() -> Result<Self, EstateError> {
        let base_dir = if let Ok(custom) = std::env::var("ESTATE_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create EstatePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (holds the database file)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the backup directory
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the default export directory
    pub fn export_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the SQLite database
    pub fn database_file(&self) -> PathBuf {
        self.data_dir().join("estate.db")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), EstateError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| EstateError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| EstateError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.backup_dir())
            .map_err(|e| EstateError::Io(format!("Failed to create backup directory: {}", e)))?;

        Ok(())
    }

    /// Check if the tracker has been initialized (database file exists)
    pub fn is_initialized(&self) -> bool {
        self.database_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, EstateError> {
    ProjectDirs::from("au", "estate", "estate")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| EstateError::Config("Could not determine a home directory".into()))
}
