//! The Exchange: the call surface of sealdrop.
//!
//! Every call locks the ledger for its whole duration, so calls are
//! serialized. A mutating call plans one [`Change`], validates it, commits it
//! to the store and only then applies it in memory. If any step fails the
//! call returns an error and neither the store nor the ledger has moved.
//!
//! A call dropped while its commit is in flight leaves the outcome unknown:
//! the store may have recorded the change without the ledger applying it.
//! The exchange marks itself unsettled before every commit and, if the call
//! never comes back to clear the mark, reloads the ledger from the store on
//! the next lock.
//!
//! The calls themselves live next to their flow: [`crate::users`],
//! [`crate::request`] and [`crate::share`].

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use sealdrop_core::{AliasGenerator, Change, Clock, Ledger, SystemClock};
use sealdrop_store::Store;

use crate::config::ExchangeConfig;
use crate::error::Result;

/// The main Exchange struct.
///
/// Provides the user, request and share calls over one shared ledger.
/// Caller identity is passed in explicitly and is assumed authenticated.
pub struct Exchange<S: Store, C: Clock = SystemClock> {
    /// The storage backend.
    store: S,
    /// Source of `requested_at` and `uploaded_at`.
    clock: C,
    /// Configuration.
    config: ExchangeConfig,
    aliases: AliasGenerator,
    /// The serialization point for every call.
    ledger: Mutex<Ledger>,
    /// Set while a commit is in flight. Only touched under the ledger lock.
    unsettled: AtomicBool,
}

impl<S: Store, C: Clock> Exchange<S, C> {
    /// Create an exchange with an empty ledger over an empty store.
    pub fn new(store: S, clock: C, config: ExchangeConfig) -> Self {
        Self::with_ledger(store, clock, config, Ledger::new())
    }

    /// Open an exchange over a store, restoring everything committed to it.
    pub async fn open(store: S, clock: C, config: ExchangeConfig) -> Result<Self> {
        let ledger = store.load().await?;
        tracing::info!(
            users = ledger.users().len(),
            files = ledger.files().len(),
            pending = ledger.aliases().len(),
            "opened exchange"
        );
        Ok(Self::with_ledger(store, clock, config, ledger))
    }

    fn with_ledger(store: S, clock: C, config: ExchangeConfig, ledger: Ledger) -> Self {
        Self {
            aliases: AliasGenerator::new(config.alias_bytes),
            store,
            clock,
            config,
            ledger: Mutex::new(ledger),
            unsettled: AtomicBool::new(false),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// A copy of the current ledger.
    pub async fn snapshot(&self) -> Ledger {
        self.lock().await.clone()
    }

    /// Lock the ledger, first settling any commit a dropped call left behind.
    ///
    /// If the store cannot be reloaded the stale ledger is returned and the
    /// exchange stays unsettled; [`Exchange::commit`] refuses to build on it.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Ledger> {
        let mut ledger = self.ledger.lock().await;
        if let Err(e) = self.settle(&mut ledger).await {
            tracing::warn!(error = %e, "reload after interrupted commit failed");
        }
        ledger
    }

    /// Reload the ledger from the store if a commit was interrupted.
    async fn settle(&self, ledger: &mut Ledger) -> Result<()> {
        if !self.unsettled.load(Ordering::SeqCst) {
            return Ok(());
        }

        *ledger = self.store.load().await?;
        self.unsettled.store(false, Ordering::SeqCst);
        tracing::info!(
            files = ledger.files().len(),
            next_file_id = ledger.files().next_file_id(),
            "reloaded ledger after interrupted commit"
        );
        Ok(())
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now()
    }

    pub(crate) fn alias_generator(&self) -> &AliasGenerator {
        &self.aliases
    }

    /// Validate, persist and apply one change.
    ///
    /// The caller must hold the ledger lock for `ledger`.
    pub(crate) async fn commit(&self, ledger: &mut Ledger, change: Change) -> Result<()> {
        self.settle(ledger).await?;
        ledger.validate(&change)?;

        // Stays set if this future is dropped before the change is applied.
        self.unsettled.store(true, Ordering::SeqCst);
        if let Err(e) = self.store.commit(&change).await {
            self.unsettled.store(false, Ordering::SeqCst);
            tracing::warn!(kind = change.kind(), error = %e, "commit failed, call aborted");
            return Err(e.into());
        }

        ledger.apply(change)?;
        self.unsettled.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealdrop_core::{FixedClock, Identity, User};
    use sealdrop_store::{MemoryStore, SqliteStore};

    fn id(b: u8) -> Identity {
        Identity::new(vec![b]).unwrap()
    }

    #[tokio::test]
    async fn test_rejected_change_is_not_committed() {
        let exchange = Exchange::new(MemoryStore::new(), FixedClock(1), ExchangeConfig::default());

        let mut ledger = exchange.lock().await;
        let err = exchange
            .commit(
                &mut ledger,
                Change::FileShared {
                    file_id: 0,
                    grantor: id(1),
                    recipient: id(2),
                    wrapped_key: vec![],
                },
            )
            .await;
        assert!(err.is_err());
        drop(ledger);

        assert!(exchange.store().is_empty());
        assert_eq!(exchange.snapshot().await, Ledger::new());
    }

    #[tokio::test]
    async fn test_open_restores_committed_state() {
        let store = std::sync::Arc::new(SqliteStore::open_memory().unwrap());
        let exchange = Exchange::new(store.clone(), FixedClock(1), ExchangeConfig::default());
        exchange.set_user(&id(1), User::new("Ada", "L", vec![1])).await.unwrap();
        exchange.request_file(&id(1), "notes").await.unwrap();
        let before = exchange.snapshot().await;
        drop(exchange);

        let reopened = Exchange::open(store, FixedClock(2), ExchangeConfig::default())
            .await
            .unwrap();
        assert_eq!(reopened.snapshot().await, before);
    }

    #[test]
    fn test_alias_entropy_from_config() {
        let config = ExchangeConfig::default().with_alias_bytes(24);
        let exchange = Exchange::new(MemoryStore::new(), FixedClock(0), config);
        assert_eq!(exchange.alias_generator().entropy_bytes(), 24);
        assert_eq!(exchange.now(), 0);
    }
}
