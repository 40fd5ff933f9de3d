//! Error types for sealdrop core.
//!
//! These are invariant violations. Expected outcomes of a call (not found,
//! permission denied, already uploaded) are response values, not errors.

use thiserror::Error;

use crate::types::FileId;

/// Errors raised when a change would break a ledger invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("file id space exhausted")]
    FileIdExhausted,

    #[error("unknown file: {0}")]
    UnknownFile(FileId),

    #[error("file {0} already exists")]
    DuplicateFile(FileId),

    #[error("file id {file_id} is below the next free id {next}")]
    StaleFileId { file_id: FileId, next: FileId },

    #[error("invalid transition for file {file_id}: {reason}")]
    InvalidTransition { file_id: FileId, reason: &'static str },

    #[error("alias is already in use")]
    AliasInUse,

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("{grantor} does not own file {file_id}")]
    NotOwner { file_id: FileId, grantor: String },

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
