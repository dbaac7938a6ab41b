//! Engine configuration
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! storage_path = "/data/tandem.sqlite3"
//! rate_jitter = 0.01
//! refresh_interval_secs = 3600
//! base_currency = "USD"
//! ```

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite file for persistence; in-memory when absent
    pub storage_path: Option<PathBuf>,
    /// Fractional noise applied by the mock rate feed
    pub rate_jitter: f64,
    /// Period of the optional background refresh
    pub refresh_interval_secs: u64,
    /// Base currency passed to the rate provider
    pub base_currency: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            rate_jitter: 0.01,
            refresh_interval_secs: 3600,
            base_currency: "USD".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| LedgerError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.rate_jitter.is_finite() || self.rate_jitter < 0.0 || self.rate_jitter >= 1.0 {
            return Err(LedgerError::ConfigError(format!(
                "rate_jitter must be in [0, 1), got {}",
                self.rate_jitter
            )));
        }
        if self.refresh_interval_secs == 0 {
            return Err(LedgerError::ConfigError(
                "refresh_interval_secs must be positive".to_string(),
            ));
        }
        if self.base_currency.trim().is_empty() {
            return Err(LedgerError::ConfigError("base_currency is empty".to_string()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
