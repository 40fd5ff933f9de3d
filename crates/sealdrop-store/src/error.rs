//! Error types for the store module.

use sealdrop_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Persisted state does not form a valid ledger.
    #[error("ledger error: {0}")]
    Core(#[from] CoreError),

    /// A lock guarding the backend was poisoned.
    #[error("store lock poisoned")]
    Poisoned,

    /// The blocking task running a query failed.
    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
