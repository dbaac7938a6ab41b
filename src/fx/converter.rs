//! Amount conversion with a rounding policy

use super::rate::RateSource;
use super::resolver::RateLookup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scaled values this close to an integer are treated as that integer
const SNAP_EPSILON: f64 = 1e-9;

/// How converted amounts are rounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    None,
    Nearest,
    Up,
    Down,
}

/// Rounding mode plus number of decimal digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingPolicy {
    pub mode: RoundingMode,
    pub precision: u32,
}

impl RoundingPolicy {
    pub fn new(mode: RoundingMode, precision: u32) -> Self {
        Self { mode, precision }
    }

    /// Leave values untouched
    pub fn none() -> Self {
        Self::new(RoundingMode::None, 0)
    }

    /// Apply the policy. `Nearest` rounds half up (`-2.5` goes to `-2`), `Up` is
    /// ceil and `Down` is floor, all at `precision` digits.
    pub fn apply(&self, value: f64) -> f64 {
        if self.mode == RoundingMode::None || !value.is_finite() {
            return value;
        }

        let factor = 10f64.powi(self.precision as i32);
        let scaled = value * factor;
        let nearest = scaled.round();
        let snapped = if (scaled - nearest).abs() < SNAP_EPSILON {
            nearest
        } else {
            scaled
        };

        let rounded = match self.mode {
            RoundingMode::Nearest => (snapped + 0.5).floor(),
            RoundingMode::Up => snapped.ceil(),
            RoundingMode::Down => snapped.floor(),
            RoundingMode::None => scaled,
        };
        rounded / factor
    }
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self::new(RoundingMode::Nearest, 2)
    }
}

/// Amount in a currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// One conversion, produced fresh per call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub original_amount: f64,
    pub original_currency: String,
    pub converted_amount: f64,
    pub converted_currency: String,
    pub rate: f64,
    pub rate_date: DateTime<Utc>,
    pub rate_source: RateSource,
}

/// Converted value that keeps the pre-conversion money alongside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedMoney {
    pub original: Money,
    pub converted: Money,
    pub rate: f64,
    pub rate_date: DateTime<Utc>,
}

impl From<ConversionResult> for ConvertedMoney {
    fn from(result: ConversionResult) -> Self {
        Self {
            original: Money::new(result.original_amount, result.original_currency),
            converted: Money::new(result.converted_amount, result.converted_currency),
            rate: result.rate,
            rate_date: result.rate_date,
        }
    }
}

/// Applies resolved rates and the rounding policy
pub struct Converter<'a, R: RateLookup + ?Sized> {
    rates: &'a R,
    policy: RoundingPolicy,
}

impl<'a, R: RateLookup + ?Sized> Converter<'a, R> {
    pub fn new(rates: &'a R, policy: RoundingPolicy) -> Self {
        Self { rates, policy }
    }

    pub fn policy(&self) -> RoundingPolicy {
        self.policy
    }

    /// Convert `amount`. Same currency returns the amount unrounded at rate 1.
    /// `None` means no rate path exists.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<ConversionResult> {
        if from == to {
            return Some(ConversionResult {
                original_amount: amount,
                original_currency: from.to_string(),
                converted_amount: amount,
                converted_currency: to.to_string(),
                rate: 1.0,
                rate_date: Utc::now(),
                rate_source: RateSource::Cached,
            });
        }

        let rate = self.rates.get_rate(from, to)?;
        Some(ConversionResult {
            original_amount: amount,
            original_currency: from.to_string(),
            converted_amount: self.policy.apply(amount * rate.rate),
            converted_currency: to.to_string(),
            rate: rate.rate,
            rate_date: rate.timestamp,
            rate_source: rate.source,
        })
    }

    /// Convert `money` into `home`
    pub fn convert_to_home(&self, money: &Money, home: &str) -> Option<ConvertedMoney> {
        self.convert(money.amount, &money.currency, home)
            .map(ConvertedMoney::from)
    }

    /// Sum of amounts expressed in `target`; unconvertible entries count as zero
    pub fn total_in(&self, amounts: &[Money], target: &str) -> f64 {
        amounts
            .iter()
            .map(|m| match self.convert(m.amount, &m.currency, target) {
                Some(result) => result.converted_amount,
                None => {
                    log::warn!("No rate for {}/{}; counted as zero", m.currency, target);
                    0.0
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::rate::ExchangeRate;
    use crate::fx::table::RateTable;

    fn table() -> RateTable {
        RateTable::from_rates(
            vec![ExchangeRate::new("EUR", "USD", 1.08, Utc::now(), RateSource::Api).unwrap()],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_rounding_modes() {
        let value = 12.3456;
        assert_eq!(RoundingPolicy::new(RoundingMode::None, 2).apply(value), value);
        assert_eq!(RoundingPolicy::new(RoundingMode::Nearest, 2).apply(value), 12.35);
        assert_eq!(RoundingPolicy::new(RoundingMode::Up, 2).apply(value), 12.35);
        assert_eq!(RoundingPolicy::new(RoundingMode::Down, 2).apply(value), 12.34);
        assert_eq!(RoundingPolicy::new(RoundingMode::Nearest, 0).apply(value), 12.0);
        assert_eq!(RoundingPolicy::new(RoundingMode::Up, 0).apply(value), 13.0);
    }

    #[test]
    fn test_nearest_rounds_half_up() {
        let policy = RoundingPolicy::new(RoundingMode::Nearest, 0);
        assert_eq!(policy.apply(2.5), 3.0);
        assert_eq!(policy.apply(-2.5), -2.0);
        assert_eq!(policy.apply(-2.6), -3.0);
        assert_eq!(RoundingPolicy::new(RoundingMode::Nearest, 1).apply(-0.25), -0.2);
    }

    #[test]
    fn test_up_absorbs_representation_noise() {
        // 100 * 1.08 is 108.00000000000001 in binary floating point
        let policy = RoundingPolicy::new(RoundingMode::Up, 2);
        assert_eq!(policy.apply(100.0 * 1.08), 108.0);
    }

    #[test]
    fn test_convert_same_currency() {
        let t = table();
        let converter = Converter::new(&t, RoundingPolicy::new(RoundingMode::Up, 0));
        let result = converter.convert(10.555, "EUR", "EUR").unwrap();
        assert_eq!(result.converted_amount, 10.555);
        assert_eq!(result.rate, 1.0);
    }

    #[test]
    fn test_convert_with_rounding() {
        let t = table();
        let converter = Converter::new(&t, RoundingPolicy::default());
        let result = converter.convert(100.0, "EUR", "USD").unwrap();
        assert_eq!(result.converted_amount, 108.0);
        assert_eq!(result.converted_currency, "USD");
        assert_eq!(result.rate_source, RateSource::Api);

        let back = converter.convert(108.0, "USD", "EUR").unwrap();
        assert_eq!(back.converted_amount, 100.0);
    }

    #[test]
    fn test_convert_unavailable() {
        let t = table();
        let converter = Converter::new(&t, RoundingPolicy::default());
        assert!(converter.convert(1.0, "EUR", "THB").is_none());
    }

    #[test]
    fn test_convert_to_home_keeps_original() {
        let t = table();
        let converter = Converter::new(&t, RoundingPolicy::default());
        let converted = converter
            .convert_to_home(&Money::new(50.0, "EUR"), "USD")
            .unwrap();
        assert_eq!(converted.original, Money::new(50.0, "EUR"));
        assert_eq!(converted.converted, Money::new(54.0, "USD"));
        assert_eq!(converted.rate, 1.08);
    }

    #[test]
    fn test_total_in_skips_unconvertible() {
        let t = table();
        let converter = Converter::new(&t, RoundingPolicy::default());
        let total = converter.total_in(
            &[Money::new(10.0, "USD"), Money::new(100.0, "EUR"), Money::new(500.0, "THB")],
            "USD",
        );
        assert_eq!(total, 118.0);
    }
}
