//! Store trait: the abstract interface for ledger persistence.

use async_trait::async_trait;
use sealdrop_core::{Change, Ledger};

use crate::error::Result;

/// The Store trait: async interface for ledger persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Contract
///
/// - `commit` is called with a change the ledger has already validated, and
///   must persist all of it or none of it. An `Err` means nothing was
///   recorded. A commit future dropped before it resolves may or may not
///   have recorded the change.
/// - `load` returns the ledger produced by every committed change, in order.
#[async_trait]
pub trait Store: Send + Sync {
    /// Durably record one change.
    async fn commit(&self, change: &Change) -> Result<()>;

    /// Rebuild the ledger from everything committed so far.
    async fn load(&self) -> Result<Ledger>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn commit(&self, change: &Change) -> Result<()> {
        (**self).commit(change).await
    }

    async fn load(&self) -> Result<Ledger> {
        (**self).load().await
    }
}
