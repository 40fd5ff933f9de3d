//! Error types for the exchange.
//!
//! Only fatal failures live here. Expected outcomes such as a missing file
//! or a refused share are response variants in [`crate::api`].

use sealdrop_core::CoreError;
use sealdrop_store::StoreError;
use thiserror::Error;

/// Errors that abort an exchange call. A failed call changes nothing.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Ledger rule violated, e.g. the file id counter is exhausted.
    #[error("ledger error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;
