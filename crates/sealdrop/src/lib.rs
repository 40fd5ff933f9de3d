//! # Sealdrop
//!
//! The server side of an encrypted file exchange. Users request files by
//! name, hand the resulting alias to someone who uploads encrypted content
//! against it, and later share the file by attaching per-recipient wrapped
//! keys. Sealdrop never sees plaintext; it keeps the bookkeeping.
//!
//! ## Key Concepts
//!
//! - **Alias**: single-use upload token for one pending file
//! - **Owner**: the identity that requested (or atomically uploaded) a file
//! - **Wrapped key**: the content key encrypted for one reader, opaque here
//! - **Change**: the one state mutation a successful call commits
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealdrop::{Exchange, ExchangeConfig};
//! use sealdrop::core::{Identity, SystemClock, User};
//! use sealdrop::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("sealdrop.db").unwrap();
//!     let exchange = Exchange::open(store, SystemClock, ExchangeConfig::default())
//!         .await
//!         .unwrap();
//!
//!     let alice = Identity::new(b"alice".to_vec()).unwrap();
//!     exchange
//!         .set_user(&alice, User::new("Alice", "Doe", vec![0u8; 32]))
//!         .await
//!         .unwrap();
//!
//!     // Hand this to whoever should upload the file.
//!     let alias = exchange.request_file(&alice, "report.pdf").await.unwrap();
//!     # let _ = alias;
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `sealdrop::core` - Data model and ledger
//! - `sealdrop::store` - Storage abstraction and SQLite
//! - `sealdrop::perms` - Access control

pub mod api;
pub mod config;
pub mod error;
pub mod exchange;
pub mod request;
pub mod share;
pub mod users;

// Re-export component crates
pub use sealdrop_core as core;
pub use sealdrop_perms as perms;
pub use sealdrop_store as store;

// Re-export main types for convenience
pub use api::{
    AliasInfo, FileData, FileDownloadResponse, FileSharingResponse, GetAliasInfoError,
    GetAliasInfoResponse, GetUsersResponse, PublicFileMetadata, UploadFileAtomicRequest,
    UploadFileError, UploadFileRequest, UploadFileResponse, UserData, WhoAmIResponse,
};
pub use config::{ExchangeConfig, DEFAULT_FILE_TYPE};
pub use error::{ExchangeError, Result};
pub use exchange::Exchange;
pub use request::infer_file_type;

// Re-export commonly used core types
pub use sealdrop_core::{FileId, FileStatus, Identity, User, WrappedKey};
