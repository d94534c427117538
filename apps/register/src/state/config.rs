//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`CARTON_*`)
//! 2. Config file (`carton.toml`, or the path in `CARTON_CONFIG`)
//! 3. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use carton_core::{MissingItemPolicy, Money};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Could not determine app data directory")]
    NoDataDir,
}

/// Application configuration.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ConfigState {
    /// Store name (shown on the dashboard)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Database file. `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Danger level for new items whose form leaves it empty.
    pub default_danger_level: Option<u64>,

    /// What checkout does with lines whose item was deleted.
    pub missing_item_policy: MissingItemPolicy,
}

impl Default for ConfigState {
    /// Returns default configuration suitable for development.
    ///
    /// ## Default Values
    /// - Store: "Carton POS"
    /// - Currency: Rs, 2 decimals
    /// - Database: platform data directory
    /// - Missing items abort checkout
    fn default() -> Self {
        ConfigState {
            store_name: "Carton POS".to_string(),
            currency_symbol: "Rs ".to_string(),
            currency_decimals: 2,
            database_path: None,
            default_danger_level: None,
            missing_item_policy: MissingItemPolicy::Abort,
        }
    }
}

impl ConfigState {
    /// Loads defaults, then the config file at `path` if it exists, then
    /// `CARTON_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                debug!(?path, "No config file, using defaults");
                ConfigState::default()
            }
            None => ConfigState::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "Config file loaded");
        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value.
    ///
    /// ## Environment Variables
    /// - `CARTON_STORE_NAME`
    /// - `CARTON_CURRENCY_SYMBOL`
    /// - `CARTON_CURRENCY_DECIMALS`
    /// - `CARTON_DB_PATH`
    /// - `CARTON_DEFAULT_DANGER_LEVEL`
    /// - `CARTON_MISSING_ITEM_POLICY` (`abort` or `skip`)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(store_name) = lookup("CARTON_STORE_NAME") {
            self.store_name = store_name;
        }

        if let Some(symbol) = lookup("CARTON_CURRENCY_SYMBOL") {
            self.currency_symbol = symbol;
        }

        if let Some(decimals) = lookup("CARTON_CURRENCY_DECIMALS") {
            self.currency_decimals = parse_value("CARTON_CURRENCY_DECIMALS", &decimals)?;
        }

        if let Some(path) = lookup("CARTON_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(level) = lookup("CARTON_DEFAULT_DANGER_LEVEL") {
            self.default_danger_level = Some(parse_value("CARTON_DEFAULT_DANGER_LEVEL", &level)?);
        }

        if let Some(policy) = lookup("CARTON_MISSING_ITEM_POLICY") {
            self.missing_item_policy = parse_value("CARTON_MISSING_ITEM_POLICY", &policy)?;
        }

        if self.missing_item_policy == MissingItemPolicy::Skip {
            warn!("Checkout will skip stock updates for deleted items");
        }

        Ok(())
    }

    /// Database file to open.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/pk.carton.pos/carton.db`
    /// - **Windows**: `%APPDATA%\carton\pos\data\carton.db`
    /// - **Linux**: `~/.local/share/pos/carton.db`
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let proj_dirs = ProjectDirs::from("pk", "carton", "pos").ok_or(ConfigError::NoDataDir)?;
        let data_dir = proj_dirs.data_dir();

        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join("carton.db"))
    }

    /// Formats an amount with the configured symbol and decimals.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "Rs 12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.cents();
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_format_currency() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_cents(1234)), "Rs 12.34");
        assert_eq!(config.format_currency(Money::from_cents(5)), "Rs 0.05");
        assert_eq!(config.format_currency(Money::from_cents(-1234)), "-Rs 12.34");
    }

    #[test]
    fn test_format_currency_no_decimals() {
        let config = ConfigState {
            currency_decimals: 0,
            ..ConfigState::default()
        };
        assert_eq!(config.format_currency(Money::from_cents(450)), "Rs 450");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ConfigState = toml::from_str(
            r#"
            store_name = "Bilal Wholesale"
            missing_item_policy = "skip"
            "#,
        )
        .unwrap();

        assert_eq!(config.store_name, "Bilal Wholesale");
        assert_eq!(config.missing_item_policy, MissingItemPolicy::Skip);
        assert_eq!(config.currency_decimals, 2);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConfigState::default();
        config
            .apply_env(env(&[
                ("CARTON_STORE_NAME", "Night Shift"),
                ("CARTON_DB_PATH", "/tmp/carton-test.db"),
                ("CARTON_DEFAULT_DANGER_LEVEL", "24"),
                ("CARTON_MISSING_ITEM_POLICY", "Skip"),
            ]))
            .unwrap();

        assert_eq!(config.store_name, "Night Shift");
        assert_eq!(config.default_danger_level, Some(24));
        assert_eq!(config.missing_item_policy, MissingItemPolicy::Skip);
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/carton-test.db")
        );
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = ConfigState::default();
        let err = config
            .apply_env(env(&[("CARTON_CURRENCY_DECIMALS", "two")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
