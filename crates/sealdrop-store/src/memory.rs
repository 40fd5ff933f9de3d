//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It keeps the committed changes as a
//! journal and replays them on load, so it has the same semantics as SQLite
//! with no persistence.

use std::sync::RwLock;

use async_trait::async_trait;

use sealdrop_core::{Change, Ledger};

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    journal: RwLock<Vec<Change>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed changes, oldest first.
    pub fn changes(&self) -> Result<Vec<Change>> {
        let journal = self.journal.read().map_err(|_| StoreError::Poisoned)?;
        Ok(journal.clone())
    }

    /// Number of committed changes.
    ///
    /// Reads through a poisoned lock. [`MemoryStore::changes`] and
    /// [`Store::load`] still report the poisoning.
    pub fn len(&self) -> usize {
        self.journal
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn commit(&self, change: &Change) -> Result<()> {
        let mut journal = self.journal.write().map_err(|_| StoreError::Poisoned)?;
        journal.push(change.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Ledger> {
        let changes = self.changes()?;
        Ok(Ledger::replay(changes)?)
    }
}
