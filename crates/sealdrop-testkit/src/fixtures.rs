//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use sealdrop::{Exchange, ExchangeConfig};
use sealdrop_core::{Change, Identity, Ledger, ManualClock, User, WrappedKey, MAX_IDENTITY_LEN};
use sealdrop_store::{MemoryStore, Store, StoreError};

use crate::wrapping::{wrap_key, ContentKey, KeyPair, Result as WrapResult};

/// A named participant with an identity, a profile and an X25519 key pair.
///
/// Everything is derived from the name, so `Party::new("alice")` is the same
/// party in every test.
#[derive(Debug)]
pub struct Party {
    pub name: String,
    pub identity: Identity,
    pub keys: KeyPair,
}

impl Party {
    pub fn new(name: &str) -> Self {
        let digest = blake3::derive_key("sealdrop-testkit party identity", name.as_bytes());
        let seed = blake3::derive_key("sealdrop-testkit party key", name.as_bytes());

        Self {
            name: name.to_string(),
            identity: Identity::try_from(&digest[..MAX_IDENTITY_LEN])
                .expect("digest prefix fits an identity"),
            keys: KeyPair::from_seed(seed),
        }
    }

    /// The profile this party registers with.
    pub fn profile(&self) -> User {
        User::new(self.name.clone(), "Tester", self.keys.public_key().to_vec())
    }

    /// `key` wrapped for this party.
    pub fn wrap(&self, key: &ContentKey) -> WrappedKey {
        wrap_key(key, &self.keys.public_key()).expect("own public key is 32 bytes")
    }

    /// Recover a content key wrapped for this party.
    pub fn unwrap(&self, wrapped: &[u8]) -> WrapResult<ContentKey> {
        self.keys.unwrap_key(wrapped)
    }
}

/// Create parties from names.
pub fn parties(names: &[&str]) -> Vec<Party> {
    names.iter().map(|name| Party::new(name)).collect()
}

/// An exchange over a [`MemoryStore`] with a manual clock.
pub struct TestExchange {
    pub exchange: Exchange<Arc<MemoryStore>, Arc<ManualClock>>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl TestExchange {
    /// Start with an empty store, the clock at 1_000.
    pub fn new() -> Self {
        Self::with_config(ExchangeConfig::default())
    }

    pub fn with_config(config: ExchangeConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_000));
        Self {
            exchange: Exchange::new(store.clone(), clock.clone(), config),
            store,
            clock,
        }
    }

    /// Register each party's profile.
    pub async fn register(&self, parties: &[&Party]) {
        for party in parties {
            self.exchange
                .set_user(&party.identity, party.profile())
                .await
                .unwrap_or_else(|e| panic!("registering {}: {}", party.name, e));
        }
    }

    /// Rebuild an exchange from everything committed so far.
    pub async fn reopen(&self) -> Exchange<Arc<MemoryStore>, Arc<ManualClock>> {
        Exchange::open(self.store.clone(), self.clock.clone(), ExchangeConfig::default())
            .await
            .unwrap_or_else(|e| panic!("reopen: {}", e))
    }
}

impl Default for TestExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestExchange {
    type Target = Exchange<Arc<MemoryStore>, Arc<ManualClock>>;

    fn deref(&self) -> &Self::Target {
        &self.exchange
    }
}

/// A store that refuses commits while armed, or records them and never
/// returns while stalled.
#[derive(Debug, Default)]
pub struct FailingStore<S> {
    inner: S,
    armed: AtomicBool,
    stalled: AtomicBool,
}

impl<S: Store> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
        }
    }

    /// Make every following commit fail until disarmed.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Let every following commit reach the inner store, then hang.
    ///
    /// Models a caller that goes away after the write landed but before the
    /// commit returned.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Back to passing every commit through.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.stalled.store(false, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Store> Store for FailingStore<S> {
    async fn commit(&self, change: &Change) -> sealdrop_store::Result<()> {
        if self.armed.load(Ordering::SeqCst) {
            return Err(StoreError::Task(format!("injected failure on {}", change.kind())));
        }
        self.inner.commit(change).await?;
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn load(&self) -> sealdrop_store::Result<Ledger> {
        self.inner.load().await
    }
}

/// Install a fmt subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
