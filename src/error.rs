//! Error types for tandem-ledger
//!
//! Only I/O-class failures are errors. Lookups that find nothing (unknown
//! currency, no rate path, missing expense or budget) return `None`/`false`.

use thiserror::Error;

/// Main error type for tandem-ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid rate for {from}/{to}: {rate}")]
    InvalidRate { from: String, to: String, rate: f64 },

    #[error("Rate provider error: {0}")]
    ProviderError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for tandem-ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;
