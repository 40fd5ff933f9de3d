//! # Sealdrop Core
//!
//! Pure data model for the sealdrop file exchange: user profiles, file
//! records and their lifecycle, single-use aliases, and the [`Ledger`] that
//! ties them together.
//!
//! This crate contains no I/O, no storage, no locking. Every mutation is
//! expressed as a [`Change`] that the ledger validates before applying, so a
//! caller can check a change, persist it elsewhere, and only then apply it.
//!
//! ## Key Types
//!
//! - [`Identity`] - Opaque caller reference supplied by the host
//! - [`User`] - Public profile (names + public key) of an identity
//! - [`FileRecord`] - A file slot with its [`FileState`] and per-recipient keys
//! - [`AliasIndex`] - Single-use upload tokens for pending files
//! - [`Ledger`] - UserRegistry + FileStore + AliasIndex
//!
//! ## Lifecycle
//!
//! ```text
//! request_file ──> Pending { alias } ──upload_file──> Uploaded { payload }
//! upload_file_atomic ─────────────────────────────────> Uploaded { payload }
//! ```
//!
//! There is no other transition. Aliases are removed from the index at the
//! moment their file leaves `Pending`.

pub mod alias;
pub mod change;
pub mod clock;
pub mod error;
pub mod file;
pub mod ledger;
pub mod types;
pub mod user;

pub use alias::{AliasGenerator, AliasIndex, DEFAULT_ALIAS_BYTES, MIN_ALIAS_BYTES};
pub use change::Change;
pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use error::{CoreError, Result};
pub use file::{FilePayload, FileRecord, FileState, FileStatus, FileStore};
pub use ledger::Ledger;
pub use types::{FileId, Identity, WrappedKey, MAX_IDENTITY_LEN};
pub use user::{User, UserRegistry};
