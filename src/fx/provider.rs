//! Rate providers
//!
//! A provider returns a complete rate set for a refresh. The bundled
//! [`MockRateProvider`] perturbs a static table by a uniform random factor,
//! standing in for a live FX feed.

use super::rate::{ExchangeRate, RateSource};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Static reference table, units of quote per 1 base
const SEED_RATES: &[(&str, &str, f64)] = &[
    ("USD", "EUR", 0.92),
    ("USD", "GBP", 0.79),
    ("USD", "JPY", 149.50),
    ("USD", "KRW", 1320.0),
    ("USD", "CNY", 7.24),
    ("USD", "THB", 35.80),
    ("USD", "VND", 24500.0),
    ("USD", "SGD", 1.34),
    ("USD", "HKD", 7.82),
    ("USD", "TWD", 31.50),
    ("USD", "AUD", 1.52),
    ("USD", "NZD", 1.64),
    ("USD", "CAD", 1.36),
    ("USD", "CHF", 0.88),
    ("USD", "MXN", 17.10),
    ("USD", "BRL", 4.95),
    ("USD", "INR", 83.20),
    ("USD", "IDR", 15600.0),
    ("USD", "PHP", 56.20),
    ("USD", "MYR", 4.70),
    ("USD", "SEK", 10.45),
    ("USD", "NOK", 10.60),
    ("USD", "DKK", 6.87),
    ("USD", "TRY", 32.10),
    ("USD", "ZAR", 18.70),
    ("USD", "AED", 3.6725),
    ("EUR", "GBP", 0.86),
    ("EUR", "CHF", 0.96),
];

/// The static table as rates stamped with `timestamp` and `source`
pub fn seed_rates(timestamp: DateTime<Utc>, source: RateSource) -> Vec<ExchangeRate> {
    SEED_RATES
        .iter()
        .map(|&(from, to, rate)| ExchangeRate {
            from: from.to_string(),
            to: to.to_string(),
            rate,
            inverse_rate: 1.0 / rate,
            timestamp,
            source,
        })
        .collect()
}

/// Source of full rate-table refreshes
pub trait RateProvider: Send + Sync {
    /// Fetch a complete rate set. `base` is a hint; providers may return more pairs.
    fn fetch_rates(&self, base: &str) -> Result<Vec<ExchangeRate>>;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// Simulated feed: static table with ±`jitter` uniform noise per rate
pub struct MockRateProvider {
    jitter: f64,
    rng: Mutex<StdRng>,
}

impl MockRateProvider {
    /// Create with the given jitter fraction (0.01 = ±1%)
    pub fn new(jitter: f64) -> Self {
        Self {
            jitter,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic variant for tests and benches
    pub fn with_seed(jitter: f64, seed: u64) -> Self {
        Self {
            jitter,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }
}

impl Default for MockRateProvider {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl RateProvider for MockRateProvider {
    fn fetch_rates(&self, base: &str) -> Result<Vec<ExchangeRate>> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| LedgerError::ProviderError(format!("Random source poisoned: {}", e)))?;
        let now = Utc::now();

        let mut rates = Vec::with_capacity(SEED_RATES.len());
        for &(from, to, rate) in SEED_RATES {
            let factor = if self.jitter > 0.0 {
                rng.gen_range((1.0 - self.jitter)..=(1.0 + self.jitter))
            } else {
                1.0
            };
            rates.push(ExchangeRate::new(from, to, rate * factor, now, RateSource::Api)?);
        }

        log::debug!("Mock provider produced {} rates (base hint {})", rates.len(), base);
        Ok(rates)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_rates_consistent() {
        let rates = seed_rates(Utc::now(), RateSource::Cached);
        assert_eq!(rates.len(), SEED_RATES.len());
        for rate in &rates {
            assert!(rate.rate > 0.0);
            assert!((rate.rate * rate.inverse_rate - 1.0).abs() < 1e-12);
            assert_eq!(rate.source, RateSource::Cached);
        }
    }

    #[test]
    fn test_mock_jitter_bounds() {
        let provider = MockRateProvider::with_seed(0.01, 7);
        let rates = provider.fetch_rates("USD").unwrap();

        for (rate, &(from, to, base)) in rates.iter().zip(SEED_RATES) {
            assert_eq!(rate.from, from);
            assert_eq!(rate.to, to);
            assert!(rate.rate >= base * 0.99 - 1e-9);
            assert!(rate.rate <= base * 1.01 + 1e-9);
            assert_eq!(rate.source, RateSource::Api);
            assert!((rate.inverse_rate - 1.0 / rate.rate).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_jitter_matches_seed() {
        let provider = MockRateProvider::with_seed(0.0, 1);
        let rates = provider.fetch_rates("USD").unwrap();
        assert_eq!(rates[0].rate, SEED_RATES[0].2);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let a = MockRateProvider::with_seed(0.01, 42).fetch_rates("USD").unwrap();
        let b = MockRateProvider::with_seed(0.01, 42).fetch_rates("USD").unwrap();
        assert_eq!(a[3].rate, b[3].rate);
    }
}
