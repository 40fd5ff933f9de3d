//! # Sealdrop Testkit
//!
//! Testing utilities for sealdrop.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: named parties, a ready-made exchange, a store that fails on demand
//! - **Wrapping**: the client side of key distribution, so tests carry real wrapped keys
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use sealdrop_testkit::{Party, TestExchange};
//!
//! let exchange = TestExchange::new();
//! let alice = Party::new("alice");
//! exchange.register(&[&alice]).await;
//! let alias = exchange.request_file(&alice.identity, "report.pdf").await?;
//! ```
//!
//! ## Key Wrapping
//!
//! ```rust
//! use sealdrop_testkit::{ContentKey, Party};
//!
//! let bob = Party::new("bob");
//! let key = ContentKey::generate();
//! let wrapped = bob.wrap(&key);
//! assert_eq!(bob.unwrap(&wrapped).unwrap(), key);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sealdrop_testkit::generators::{ops, Op};
//!
//! proptest! {
//!     #[test]
//!     fn invariants_hold(ops in ops(3, 8, 40)) {
//!         // run each op against an exchange, check the ledger
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod wrapping;

pub use fixtures::{init_tracing, parties, FailingStore, Party, TestExchange};
pub use generators::Op;
pub use wrapping::{wrap_key, ContentKey, KeyPair, WrapError};
