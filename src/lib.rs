//! # Tandem Ledger
//!
//! A multi-currency travel ledger: exchange-rate table with USD cross
//! rates, conversion under a rounding policy, locale-style money
//! formatting, an expense ledger with conversion snapshots, budgets with
//! sticky alerts, and a physical-cash wallet.
//!
//! ## Example
//!
//! ```rust
//! use tandem_ledger::prelude::*;
//! use chrono::NaiveDate;
//!
//! let engine = LedgerEngine::in_memory().unwrap();
//! engine
//!     .currency()
//!     .insert_rate(ExchangeRate::new("EUR", "USD", 1.08, chrono::Utc::now(), RateSource::Api).unwrap())
//!     .unwrap();
//!
//! let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let expense = engine
//!     .add_expense(NewExpense::new(100.0, "EUR", "Museum", ExpenseCategory::Activities, date))
//!     .unwrap();
//! assert_eq!(expense.converted_amount, Some(108.0));
//!
//! let text = format_amount(1234.5, "USD", &FormatOptions::default());
//! assert_eq!(text, "$1,234.50");
//! ```

pub mod config;
pub mod currency;
pub mod engine;
pub mod error;
pub mod finance;
pub mod format;
pub mod fx;
pub mod preferences;
#[cfg(feature = "async")]
pub mod refresh;
pub mod service;
pub mod storage;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::EngineConfig;
    pub use crate::currency::{get_currency, Currency};
    pub use crate::engine::LedgerEngine;
    pub use crate::error::{LedgerError, Result};
    pub use crate::finance::{
        Budget, CashTransactionType, Expense, ExpenseCategory, ExpenseUpdate, NewExpense,
        PaymentMethod,
    };
    pub use crate::format::{format_amount, FormatOptions};
    pub use crate::fx::{
        ConversionResult, ExchangeRate, Money, RateLookup, RateSource, RateTable, RoundingMode,
        RoundingPolicy,
    };
    pub use crate::preferences::{CurrencyPreferences, PreferencesUpdate};
    pub use crate::service::CurrencyService;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_round_trip() {
        let engine = LedgerEngine::in_memory().unwrap();
        let result = engine.currency().convert(10.0, "USD", "USD").unwrap().unwrap();
        assert_eq!(result.converted_amount, 10.0);
        assert_eq!(result.rate, 1.0);
    }
}
