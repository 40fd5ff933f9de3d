//! Exchange configuration.

use serde::{Deserialize, Serialize};

use sealdrop_core::DEFAULT_ALIAS_BYTES;

/// Type recorded for atomic uploads whose name has no known extension.
pub const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

/// Configuration for the [`Exchange`](crate::Exchange).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Entropy of generated alias tokens, in bytes. Raised to
    /// [`MIN_ALIAS_BYTES`](sealdrop_core::MIN_ALIAS_BYTES) if lower.
    pub alias_bytes: usize,

    /// File type for `upload_file_atomic` when the name's extension is unknown.
    pub default_file_type: String,
}

impl ExchangeConfig {
    pub fn with_alias_bytes(mut self, alias_bytes: usize) -> Self {
        self.alias_bytes = alias_bytes;
        self
    }

    pub fn with_default_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.default_file_type = file_type.into();
        self
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            alias_bytes: DEFAULT_ALIAS_BYTES,
            default_file_type: DEFAULT_FILE_TYPE.to_string(),
        }
    }
}
