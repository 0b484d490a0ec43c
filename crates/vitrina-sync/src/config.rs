//! # Catalog Configuration
//!
//! Configuration for rate fetching, storage and display.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     VITRINA_OFFICIAL_URL=https://...                                   │
//! │     VITRINA_MAX_RATE_AGE_SECS=43200                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/catalog/catalog.toml (Linux)                             │
//! │     ~/Library/Application Support/com.vitrina.catalog/catalog.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [rates]
//! official_url = "https://ve.dolarapi.com/v1/dolares/oficial"
//! official_field = "promedio"
//! informal_url = "https://criptoya.com/api/binancep2p/USDT/VES/1"
//! timeout_secs = 12
//! refresh_interval_secs = 300
//! max_age_secs = 86400
//!
//! [store]
//! database_path = "/var/lib/vitrina/vitrina.db"
//!
//! [display]
//! locale = "es-ve"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use vitrina_core::pricing::NumberLocale;
use vitrina_core::{CELL_DECIMALS, LIST_DECIMALS};

use crate::error::{SyncError, SyncResult};

/// Default official (BCV) endpoint.
pub const DEFAULT_OFFICIAL_URL: &str = "https://ve.dolarapi.com/v1/dolares/oficial";

/// Default informal (USDT P2P) endpoint.
pub const DEFAULT_INFORMAL_URL: &str = "https://criptoya.com/api/binancep2p/USDT/VES/1";

/// Upper bound for every duration setting (one year).
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

// =============================================================================
// Rate Settings
// =============================================================================

/// Exchange-rate endpoints and refresh policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSettings {
    /// GET endpoint returning the official rate.
    #[serde(default = "default_official_url")]
    pub official_url: String,

    /// JSON field holding the official rate. Dotted paths reach into
    /// nested objects (`"rates.usd"`).
    #[serde(default = "default_official_field")]
    pub official_field: String,

    /// GET endpoint returning `ask` / `bid` for USDT.
    #[serde(default = "default_informal_url")]
    pub informal_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Background refresh interval (seconds).
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Rates older than this are reported as unknown to pricing (seconds).
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

fn default_official_url() -> String {
    DEFAULT_OFFICIAL_URL.to_string()
}
fn default_official_field() -> String {
    "promedio".to_string()
}
fn default_informal_url() -> String {
    DEFAULT_INFORMAL_URL.to_string()
}
fn default_timeout() -> u64 {
    12
}
fn default_refresh_interval() -> u64 {
    300
}
fn default_max_age() -> u64 {
    24 * 60 * 60
}

impl Default for RateSettings {
    fn default() -> Self {
        RateSettings {
            official_url: default_official_url(),
            official_field: default_official_field(),
            informal_url: default_informal_url(),
            timeout_secs: default_timeout(),
            refresh_interval_secs: default_refresh_interval(),
            max_age_secs: default_max_age(),
        }
    }
}

impl RateSettings {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Background refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Staleness ceiling.
    pub fn max_age(&self) -> chrono::Duration {
        i64::try_from(self.max_age_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Where products are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Display Settings
// =============================================================================

/// How amounts are shown to the admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub locale: NumberLocale,

    /// Decimals in the product list.
    #[serde(default = "default_list_decimals")]
    pub list_decimals: u8,

    /// Decimals in the editable price cell.
    #[serde(default = "default_cell_decimals")]
    pub cell_decimals: u8,
}

fn default_list_decimals() -> u8 {
    LIST_DECIMALS
}
fn default_cell_decimals() -> u8 {
    CELL_DECIMALS
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            locale: NumberLocale::default(),
            list_decimals: default_list_decimals(),
            cell_decimals: default_cell_decimals(),
        }
    }
}

// =============================================================================
// Catalog Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub rates: RateSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub display: DisplaySettings,
}

impl CatalogConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (catalog.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading catalog config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
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
            warn!("Failed to load catalog config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Catalog config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        validate_endpoint("official_url", &self.rates.official_url)?;
        validate_endpoint("informal_url", &self.rates.informal_url)?;

        if self.rates.official_field.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "official_field must not be empty".into(),
            ));
        }

        for (name, value) in [
            ("timeout_secs", self.rates.timeout_secs),
            ("refresh_interval_secs", self.rates.refresh_interval_secs),
            ("max_age_secs", self.rates.max_age_secs),
        ] {
            if value == 0 || value > MAX_DURATION_SECS {
                return Err(SyncError::InvalidConfig(format!(
                    "{} must be between 1 and {}",
                    name, MAX_DURATION_SECS
                )));
            }
        }

        if self.display.list_decimals > 8 || self.display.cell_decimals > 8 {
            return Err(SyncError::InvalidConfig(
                "display decimals must be at most 8".into(),
            ));
        }

        Ok(())
    }

    /// Applies `VITRINA_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are skipped.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("VITRINA_OFFICIAL_URL") {
            debug!(url = %url, "Overriding official rate URL from environment");
            self.rates.official_url = url;
        }

        if let Some(field) = lookup("VITRINA_OFFICIAL_FIELD") {
            self.rates.official_field = field;
        }

        if let Some(url) = lookup("VITRINA_INFORMAL_URL") {
            debug!(url = %url, "Overriding informal rate URL from environment");
            self.rates.informal_url = url;
        }

        let numeric = [
            ("VITRINA_RATE_TIMEOUT_SECS", &mut self.rates.timeout_secs),
            (
                "VITRINA_REFRESH_INTERVAL_SECS",
                &mut self.rates.refresh_interval_secs,
            ),
            ("VITRINA_MAX_RATE_AGE_SECS", &mut self.rates.max_age_secs),
        ];
        for (key, slot) in numeric {
            if let Some(raw) = lookup(key) {
                match raw.parse::<u64>() {
                    Ok(value) => *slot = value,
                    Err(_) => warn!(key, value = %raw, "Ignoring non-numeric override"),
                }
            }
        }

        if let Some(path) = lookup("VITRINA_DB_PATH") {
            self.store.database_path = Some(PathBuf::from(path));
        }

        if let Some(locale) = lookup("VITRINA_LOCALE") {
            match locale.to_lowercase().replace('_', "-").as_str() {
                "en-us" | "en" => self.display.locale = NumberLocale::EnUs,
                "es-ve" | "es" => self.display.locale = NumberLocale::EsVe,
                _ => warn!(locale = %locale, "Unknown locale in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "vitrina", "catalog")
            .map(|dirs| dirs.config_dir().join("catalog.toml"))
    }

    /// Database file to open: the configured one, else the platform data
    /// directory, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        self.store
            .database_path
            .clone()
            .or_else(|| {
                directories::ProjectDirs::from("com", "vitrina", "catalog")
                    .map(|dirs| dirs.data_dir().join("vitrina.db"))
            })
            .unwrap_or_else(|| PathBuf::from("vitrina.db"))
    }
}

fn validate_endpoint(name: &str, raw: &str) -> SyncResult<()> {
    let url = Url::parse(raw)
        .map_err(|e| SyncError::InvalidUrl(format!("{}: {} ({})", name, raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SyncError::InvalidUrl(format!(
            "{} must start with http:// or https://, got: {}",
            name, raw
        )));
    }

    Ok(())
}
