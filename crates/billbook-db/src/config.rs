//! # Book Configuration
//!
//! Settings for the database and the billing rules.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BILLBOOK_DB_PATH=/data/book.db                                     │
//! │     BILLBOOK_ALLOCATION_MODE=spill_partial                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/billbook/billbook.toml (Linux)                           │
//! │     ~/Library/Application Support/app.billbook.billbook/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     18% GST, low-stock at 5, whole-invoice allocation                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "billbook.db"
//! max_connections = 5
//!
//! [billing]
//! default_gst_bps = 1800
//! low_stock_threshold = 5
//! allocation_mode = "whole_invoices"   # or "spill_partial"
//! ```

use std::path::PathBuf;

use billbook_core::{AllocationMode, TaxRate, DEFAULT_GST_BPS, DEFAULT_LOW_STOCK_ALERT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::pool::DbConfig;

const CONFIG_FILE_NAME: &str = "billbook.toml";
const DATABASE_FILE_NAME: &str = "billbook.db";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("app", "billbook", "billbook")
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl From<&DatabaseSettings> for DbConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        DbConfig::new(settings.path.clone()).max_connections(settings.max_connections)
    }
}

// =============================================================================
// Billing Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSettings {
    /// GST applied to new documents that do not name a rate, in basis points.
    #[serde(default = "default_gst_bps")]
    pub default_gst_bps: u32,

    /// Threshold for products without their own `low_stock_alert`.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,

    /// How payments are spread over open invoices.
    #[serde(default)]
    pub allocation_mode: AllocationMode,
}

fn default_gst_bps() -> u32 {
    DEFAULT_GST_BPS
}

fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_ALERT
}

impl Default for BillingSettings {
    fn default() -> Self {
        BillingSettings {
            default_gst_bps: default_gst_bps(),
            low_stock_threshold: default_low_stock_threshold(),
            allocation_mode: AllocationMode::default(),
        }
    }
}

impl BillingSettings {
    pub fn default_gst_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.default_gst_bps)
    }
}

// =============================================================================
// Book Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub billing: BillingSettings,
}

impl BookConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`billbook.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        billbook_core::validation::validate_gst_rate(self.billing.default_gst_rate())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.billing.low_stock_threshold < 0 {
            return Err(ConfigError::Invalid(
                "billing.low_stock_threshold must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("BILLBOOK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(bps) = std::env::var("BILLBOOK_GST_BPS") {
            match bps.parse::<u32>() {
                Ok(bps) => self.billing.default_gst_bps = bps,
                Err(_) => warn!(value = %bps, "Ignoring non-numeric BILLBOOK_GST_BPS"),
            }
        }

        if let Ok(threshold) = std::env::var("BILLBOOK_LOW_STOCK") {
            match threshold.parse::<i64>() {
                Ok(threshold) => self.billing.low_stock_threshold = threshold,
                Err(_) => warn!(value = %threshold, "Ignoring non-numeric BILLBOOK_LOW_STOCK"),
            }
        }

        if let Ok(mode) = std::env::var("BILLBOOK_ALLOCATION_MODE") {
            match mode.parse::<AllocationMode>() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding allocation mode from environment");
                    self.billing.allocation_mode = parsed;
                }
                Err(e) => warn!(error = %e, "Ignoring BILLBOOK_ALLOCATION_MODE"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::from(&self.database)
    }
}
