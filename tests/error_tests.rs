//! Error creation, message formatting and propagation

use std::sync::Arc;
use tandem_ledger::config::EngineConfig;
use tandem_ledger::error::{LedgerError, Result};
use tandem_ledger::fx::{ExchangeRate, MockRateProvider, RateProvider, RateSource};
use tandem_ledger::service::CurrencyService;
use tandem_ledger::storage::{KeyValueStore, Storage};

#[test]
fn test_invalid_rate_message() {
    let err = ExchangeRate::new("EUR", "USD", -1.0, chrono::Utc::now(), RateSource::Api).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Invalid rate"));
    assert!(msg.contains("EUR/USD"));
    assert!(msg.contains("-1"));
}

#[test]
fn test_zero_and_nan_rates_rejected() {
    let now = chrono::Utc::now();
    assert!(matches!(
        ExchangeRate::new("EUR", "USD", 0.0, now, RateSource::Api),
        Err(LedgerError::InvalidRate { .. })
    ));
    assert!(ExchangeRate::new("EUR", "USD", f64::NAN, now, RateSource::Api).is_err());
    assert!(ExchangeRate::new("EUR", "USD", f64::INFINITY, now, RateSource::Api).is_err());
}

#[test]
fn test_config_error_message() {
    let err = EngineConfig::from_toml_str("refresh_interval_secs = 0").unwrap_err();
    assert!(matches!(err, LedgerError::ConfigError(_)));
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
fn test_io_error_conversion() {
    let err = EngineConfig::load(std::path::Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(matches!(err, LedgerError::IoError(_)));
}

#[test]
fn test_serde_error_conversion() {
    let parse: std::result::Result<Vec<ExchangeRate>, _> = serde_json::from_str("{not json");
    let err: LedgerError = parse.unwrap_err().into();
    assert!(err.to_string().starts_with("Serialization error"));
}

#[test]
fn test_invalid_input_message() {
    let err = LedgerError::InvalidInput("amount must be positive".to_string());
    assert_eq!(err.to_string(), "Invalid input: amount must be positive");
}

struct FailingProvider;

impl RateProvider for FailingProvider {
    fn fetch_rates(&self, _base: &str) -> Result<Vec<ExchangeRate>> {
        Err(LedgerError::ProviderError("feed offline".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[test]
fn test_provider_failure_keeps_table() {
    let service =
        CurrencyService::open(Arc::new(Storage::in_memory()), Box::new(FailingProvider)).unwrap();
    let before = service.rate_table_snapshot().unwrap();

    assert!(!service.fetch_latest_rates("USD"));
    assert_eq!(service.rate_table_snapshot().unwrap(), before);
    assert!(service.rates_last_fetched().unwrap().is_none());
}

struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(LedgerError::StorageError(format!("disk full writing {}", key)))
    }
}

#[test]
fn test_storage_failure_propagates() {
    let service = CurrencyService::open(
        Arc::new(Storage::new(Arc::new(BrokenStore))),
        Box::new(MockRateProvider::with_seed(0.01, 5)),
    )
    .unwrap();

    let err = service.add_recent_currency("EUR").unwrap_err();
    assert!(err.to_string().contains("disk full"));
    // Cached preferences were not touched
    assert!(service.preferences().unwrap().recent_currencies.is_empty());
    // Refresh reports failure instead of erroring
    assert!(!service.fetch_latest_rates("USD"));
}
