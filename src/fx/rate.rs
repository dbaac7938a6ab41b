//! Exchange rate record

use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Fetched by the last table refresh
    Api,
    /// Seeded, derived or identity
    Cached,
}

/// Directed rate: `rate` units of `to` per 1 `from`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub inverse_rate: f64,
    pub timestamp: DateTime<Utc>,
    pub source: RateSource,
}

impl ExchangeRate {
    /// Create a rate, deriving `inverse_rate`. Rejects non-positive or non-finite rates.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        rate: f64,
        timestamp: DateTime<Utc>,
        source: RateSource,
    ) -> Result<Self> {
        let from = from.into();
        let to = to.into();
        if !rate.is_finite() || rate <= 0.0 {
            return Err(LedgerError::InvalidRate { from, to, rate });
        }

        Ok(Self {
            from,
            to,
            rate,
            inverse_rate: 1.0 / rate,
            timestamp,
            source,
        })
    }

    /// Identity rate for `code -> code`
    pub fn identity(code: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            from: code.to_string(),
            to: code.to_string(),
            rate: 1.0,
            inverse_rate: 1.0,
            timestamp,
            source: RateSource::Cached,
        }
    }

    /// The opposite direction, keeping timestamp and source
    pub fn inverted(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
            rate: self.inverse_rate,
            inverse_rate: self.rate,
            timestamp: self.timestamp,
            source: self.source,
        }
    }

    /// Same pair, new rate value; inverse is recomputed
    pub fn with_rate(&self, rate: f64) -> Result<Self> {
        Self::new(self.from.clone(), self.to.clone(), rate, self.timestamp, self.source)
    }
}
