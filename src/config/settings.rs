//! User settings for the estate tracker
//!
//! Manages user preferences including currency, backup retention, the market
//! data cache lifetime, and the logging level.

use serde::{Deserialize, Serialize};

use super::paths::EstatePaths;
use crate::error::EstateError;

/// Backup retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of daily backups to keep
    pub daily_count: u32,
    /// Number of monthly backups to keep
    pub monthly_count: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self {
            daily_count: 30,
            monthly_count: 12,
        }
    }
}

/// Market intelligence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSettings {
    /// How long a fetched indicator stays fresh, in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// World Bank API base URL
    #[serde(default = "default_world_bank_url")]
    pub world_bank_url: String,

    /// Country code used for World Bank queries
    #[serde(default = "default_country")]
    pub country: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_world_bank_url() -> String {
    "https://api.worldbank.org/v2".to_string()
}

fn default_country() -> String {
    "AUS".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            world_bank_url: default_world_bank_url(),
            country: default_country(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

/// User settings for the estate tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol used for display
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// ISO currency code stored with quotes and monthly expenses
    #[serde(default = "default_currency_code")]
    pub currency_code: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Backup retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// Market intelligence settings
    #[serde(default)]
    pub market: MarketSettings,

    /// Default number of months shown in the cash-flow trend
    #[serde(default = "default_trend_months")]
    pub trend_months: u32,

    /// Logging level for the `estate` target (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_currency_code() -> String {
    "AUD".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_trend_months() -> u32 {
    6
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency_symbol(),
            currency_code: default_currency_code(),
            date_format: default_date_format(),
            backup_retention: BackupRetention::default(),
            market: MarketSettings::default(),
            trend_months: default_trend_months(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &EstatePaths) -> Result<Self, EstateError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| EstateError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                EstateError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &EstatePaths) -> Result<(), EstateError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| EstateError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| EstateError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.currency_code, "AUD");
        assert_eq!(settings.market.cache_ttl_secs, 3600);
        assert_eq!(settings.backup_retention.daily_count, 30);
        assert_eq!(settings.backup_retention.monthly_count, 12);
        assert_eq!(settings.trend_months, 6);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = EstatePaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.market.cache_ttl_secs = 60;
        settings.log_level = "debug".into();
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.market.cache_ttl_secs, 60);
        assert_eq!(loaded.log_level, "debug");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = EstatePaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"currency_symbol": "A$"}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.currency_symbol, "A$");
        assert_eq!(loaded.currency_code, "AUD");
        assert_eq!(loaded.market.world_bank_url, "https://api.worldbank.org/v2");
    }
}
