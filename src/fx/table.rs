//! In-memory rate table
//!
//! Holds the current best-known rate per directed pair. A refresh replaces
//! the whole table; single inserts are for manual rates and tests.

use super::rate::ExchangeRate;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use hashbrown::HashMap;

/// Directed pair -> rate, plus the last refresh timestamp
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<(String, String), ExchangeRate>,
    last_fetched: Option<DateTime<Utc>>,
}

impl RateTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of rates. Later duplicates of a pair win.
    pub fn from_rates(rates: Vec<ExchangeRate>, last_fetched: Option<DateTime<Utc>>) -> Result<Self> {
        let mut table = Self::new();
        for rate in rates {
            table.insert(rate)?;
        }
        table.last_fetched = last_fetched;
        Ok(table)
    }

    /// Insert or overwrite a single pair. A stored reverse pair is dropped so
    /// both directions resolve from the one rate.
    pub fn insert(&mut self, rate: ExchangeRate) -> Result<()> {
        if !rate.rate.is_finite() || rate.rate <= 0.0 {
            return Err(LedgerError::InvalidRate {
                from: rate.from,
                to: rate.to,
                rate: rate.rate,
            });
        }

        self.rates.remove(&(rate.to.clone(), rate.from.clone()));
        self.rates.insert((rate.from.clone(), rate.to.clone()), rate);
        Ok(())
    }

    /// Direct lookup only; see [`RateLookup`](super::RateLookup) for resolution
    pub fn get(&self, from: &str, to: &str) -> Option<&ExchangeRate> {
        self.rates.get(&(from.to_string(), to.to_string()))
    }

    /// Replace every rate at once
    pub fn replace_all(&mut self, rates: Vec<ExchangeRate>, fetched_at: DateTime<Utc>) -> Result<()> {
        *self = Self::from_rates(rates, Some(fetched_at))?;
        Ok(())
    }

    pub fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.last_fetched
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Every stored rate, sorted by pair for stable output
    pub fn rates(&self) -> Vec<ExchangeRate> {
        let mut out: Vec<ExchangeRate> = self.rates.values().cloned().collect();
        out.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        out
    }
}
