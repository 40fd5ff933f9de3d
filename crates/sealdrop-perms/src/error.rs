//! Error types for the permissions module.

use sealdrop_core::FileId;
use thiserror::Error;

/// Reasons a share is refused.
///
/// Callers see all of them as one permission error; the variants exist for
/// logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// File not found.
    #[error("file not found: {0}")]
    FileNotFound(FileId),

    /// Caller is not the owner.
    #[error("caller does not own file {0}")]
    NotOwner(FileId),

    /// Target has no registered profile.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(String),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
