//! Rate resolution: identity, direct, inverse, then cross via the pivot

use super::rate::{ExchangeRate, RateSource};
use super::table::RateTable;
use crate::currency::PIVOT_CURRENCY;
use chrono::Utc;

/// Trait for resolving a rate between two currencies
pub trait RateLookup: Send + Sync {
    /// Rate such that: to_amount = from_amount * rate. `None` when no path exists.
    fn get_rate(&self, from: &str, to: &str) -> Option<ExchangeRate>;

    /// Check if a rate is available
    fn has_rate(&self, from: &str, to: &str) -> bool {
        self.get_rate(from, to).is_some()
    }
}

impl RateTable {
    fn try_inverse(&self, from: &str, to: &str) -> Option<ExchangeRate> {
        self.get(to, from).map(ExchangeRate::inverted)
    }

    /// Cross rate via the pivot. Both legs have the pivot as one endpoint,
    /// so they end at the direct or inverse step and never come back here.
    fn try_cross_rate(&self, from: &str, to: &str) -> Option<ExchangeRate> {
        if from == PIVOT_CURRENCY || to == PIVOT_CURRENCY {
            return None;
        }

        let from_to_pivot = self.get_rate(from, PIVOT_CURRENCY)?;
        let pivot_to_to = self.get_rate(PIVOT_CURRENCY, to)?;
        let rate = from_to_pivot.rate * pivot_to_to.rate;

        Some(ExchangeRate {
            from: from.to_string(),
            to: to.to_string(),
            rate,
            inverse_rate: 1.0 / rate,
            timestamp: Utc::now(),
            source: RateSource::Cached,
        })
    }
}

impl RateLookup for RateTable {
    fn get_rate(&self, from: &str, to: &str) -> Option<ExchangeRate> {
        if from == to {
            return Some(ExchangeRate::identity(from, Utc::now()));
        }

        if let Some(rate) = self.get(from, to) {
            return Some(rate.clone());
        }

        if let Some(rate) = self.try_inverse(from, to) {
            return Some(rate);
        }

        self.try_cross_rate(from, to)
    }
}
