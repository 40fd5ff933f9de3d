//! # Sealdrop Permissions
//!
//! Access control over file records and per-recipient key grants.
//!
//! ## Overview
//!
//! Permissions are not stored as flags. They follow from two facts recorded
//! on every [`FileRecord`](sealdrop_core::FileRecord): who owns it, and who
//! holds a wrapped key in its `shared_with` map.
//!
//! - **can_read**: the caller is the owner, or has a wrapped key
//! - **can_share**: the caller is the owner
//!
//! The predicates are evaluated against the current ledger on every call and
//! never cached.
//!
//! ## Key Model
//!
//! The content key is wrapped once per reader, client side:
//!
//! 1. **Owner key**: supplied by the uploader, wrapped for the owner
//! 2. **Shared keys**: supplied by the owner, one per recipient
//!
//! A reader is only ever handed the key wrapped for them.

pub mod access;
pub mod error;
pub mod grant;

pub use access::{can_read, can_share, key_for, AccessControl, ReadAccess};
pub use error::{PermsError, Result};
pub use grant::ShareGrant;
