//! Foreign Exchange (FX) rate system
//!
//! Rates flow one way: table -> resolver -> converter.
//!
//! # Components
//!
//! - **rate**: `ExchangeRate` record and its source tag
//! - **table**: in-memory directed-pair rate table
//! - **resolver**: `RateLookup` trait; identity, direct, inverse, cross via USD
//! - **provider**: pluggable full-table rate feeds, including the jittered mock
//! - **converter**: rounding policy and amount conversion
//! - **quick**: MRU list of quick-conversion pairs
//!
//! # Example
//!
//! ```rust
//! use tandem_ledger::fx::{Converter, ExchangeRate, RateLookup, RateSource, RateTable, RoundingPolicy};
//! use chrono::Utc;
//!
//! let mut table = RateTable::new();
//! table.insert(ExchangeRate::new("EUR", "USD", 1.20, Utc::now(), RateSource::Api).unwrap()).unwrap();
//!
//! // Inverse direction is derived
//! let rate = table.get_rate("USD", "EUR").unwrap();
//! assert!((rate.rate - 1.0 / 1.20).abs() < 1e-12);
//!
//! let converter = Converter::new(&table, RoundingPolicy::default());
//! let result = converter.convert(100.0, "EUR", "USD").unwrap();
//! assert_eq!(result.converted_amount, 120.0);
//! ```

pub mod converter;
pub mod provider;
pub mod quick;
pub mod rate;
pub mod resolver;
pub mod table;

pub use converter::{ConversionResult, ConvertedMoney, Converter, Money, RoundingMode, RoundingPolicy};
pub use provider::{seed_rates, MockRateProvider, RateProvider};
pub use quick::QuickConversion;
pub use rate::{ExchangeRate, RateSource};
pub use resolver::RateLookup;
pub use table::RateTable;
