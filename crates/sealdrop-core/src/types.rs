//! Strong type definitions for sealdrop.
//!
//! Identities are newtypes so they cannot be confused with key material.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Identifier of a file record, allocated by the ledger counter.
pub type FileId = u64;

/// Ciphertext of a content key, wrapped for one specific recipient.
///
/// Opaque to sealdrop: it is stored and returned byte-for-byte.
pub type WrappedKey = Vec<u8>;

/// Maximum identity length in bytes (host principals are at most 29 bytes).
pub const MAX_IDENTITY_LEN: usize = 29;

/// The authenticated caller reference the host attaches to every call.
///
/// Opaque bytes, compared for equality and ordered bytewise so that it can
/// key ordered maps. Deserialization enforces the same length limit as
/// [`Identity::new`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Identity(Vec<u8>);

impl Identity {
    /// The anonymous identity used by unauthenticated hosts.
    pub fn anonymous() -> Self {
        Self(vec![0x04])
    }

    /// Create an identity from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() > MAX_IDENTITY_LEN {
            return Err(CoreError::InvalidIdentity(format!(
                "expected at most {} bytes, got {}",
                MAX_IDENTITY_LEN,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidIdentity(e.to_string()))?;
        Self::new(bytes)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.to_hex())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for Identity {
    type Error = CoreError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::new(bytes)
    }
}

impl From<Identity> for Vec<u8> {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl TryFrom<&[u8]> for Identity {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        Self::new(slice.to_vec())
    }
}
