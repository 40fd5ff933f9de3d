//! Single-use upload aliases.
//!
//! An alias is a bearer credential: whoever holds it can look up the pending
//! file it points at and upload content for it. Tokens therefore come from a
//! cryptographically secure generator and must never be logged.

use std::collections::BTreeMap;

use rand::RngCore;

use crate::error::{CoreError, Result};
use crate::types::FileId;

/// Default alias entropy in bytes (32 hex characters).
pub const DEFAULT_ALIAS_BYTES: usize = 16;

/// Lower bound on alias entropy in bytes.
pub const MIN_ALIAS_BYTES: usize = 8;

/// Alias -> pending file id.
///
/// Every entry points at a record that is still `Pending`; the ledger removes
/// the entry in the same change that uploads the file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AliasIndex {
    aliases: BTreeMap<String, FileId>,
}

impl AliasIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, alias: &str) -> Option<FileId> {
        self.aliases.get(alias).copied()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.aliases.contains_key(alias)
    }

    /// Register a fresh alias. An alias is never bound twice.
    pub fn insert(&mut self, alias: String, file_id: FileId) -> Result<()> {
        if self.aliases.contains_key(&alias) {
            return Err(CoreError::AliasInUse);
        }
        self.aliases.insert(alias, file_id);
        Ok(())
    }

    /// Consume an alias.
    pub fn remove(&mut self, alias: &str) -> Option<FileId> {
        self.aliases.remove(alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FileId)> {
        self.aliases.iter().map(|(a, id)| (a.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Generates unguessable alias tokens.
#[derive(Debug, Clone, Copy)]
pub struct AliasGenerator {
    bytes: usize,
}

impl AliasGenerator {
    /// A generator producing `bytes` bytes of entropy per token.
    ///
    /// Values below [`MIN_ALIAS_BYTES`] are raised to it.
    pub fn new(bytes: usize) -> Self {
        Self {
            bytes: bytes.max(MIN_ALIAS_BYTES),
        }
    }

    /// Entropy per token in bytes.
    pub fn entropy_bytes(&self) -> usize {
        self.bytes
    }

    /// A fresh random token, hex encoded.
    pub fn generate(&self) -> String {
        let mut buf = vec![0u8; self.bytes];
        rand::thread_rng().fill_bytes(&mut buf);
        hex::encode(buf)
    }

    /// A fresh token that is not currently bound in `index`.
    ///
    /// Consumed aliases are not remembered, so a token could in principle be
    /// issued again after its upload. With at least [`MIN_ALIAS_BYTES`] of
    /// entropy the chance is negligible, and a reissued token only ever
    /// resolves to the file it was reissued for.
    pub fn generate_unused(&self, index: &AliasIndex) -> String {
        loop {
            let alias = self.generate();
            if !index.contains(&alias) {
                return alias;
            }
        }
    }
}

impl Default for AliasGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ALIAS_BYTES)
    }
}
