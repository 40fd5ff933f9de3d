//! # Sealdrop Store
//!
//! Persistence for the sealdrop [`Ledger`](sealdrop_core::Ledger). Provides a
//! trait-based interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The exchange never writes tables directly. Every successful call produces
//! exactly one [`Change`](sealdrop_core::Change); the store persists it with
//! [`Store::commit`] before the change is applied in memory, and
//! [`Store::load`] rebuilds the ledger on startup.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory change journal for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealdrop_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("sealdrop.db").unwrap();
//!
//!     // Rebuild the ledger from what was committed before
//!     let ledger = store.load().await.unwrap();
//!     assert!(ledger.check_invariants().is_ok());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **One change, one transaction**: a commit either lands completely or not at all
//! - **Monotonic counter**: `next_file_id` is persisted, so ids are never reused
//! - **Derived aliases**: the alias index is rebuilt from pending rows on load

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;
