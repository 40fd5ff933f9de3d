//! Changes: the single state mutation a committed call produces.
//!
//! Flows plan a change against the current ledger, the store persists it,
//! and the ledger applies it. Replaying the committed changes in order
//! rebuilds the ledger.

use crate::file::FilePayload;
use crate::types::{FileId, Identity, WrappedKey};
use crate::user::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A profile was set for `identity`.
    UserSet { identity: Identity, user: User },

    /// A file slot was requested and bound to a fresh alias.
    FileRequested {
        file_id: FileId,
        file_name: String,
        owner: Identity,
        alias: String,
        requested_at: u64,
    },

    /// A pending file received its content; its alias is consumed.
    FileUploaded {
        file_id: FileId,
        uploaded_at: u64,
        payload: FilePayload,
    },

    /// A file was created directly in the uploaded state.
    FileCreated {
        file_id: FileId,
        file_name: String,
        owner: Identity,
        uploaded_at: u64,
        payload: FilePayload,
    },

    /// `grantor` gave `recipient` a key wrapped for them.
    FileShared {
        file_id: FileId,
        grantor: Identity,
        recipient: Identity,
        wrapped_key: WrappedKey,
    },
}

impl Change {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Change::UserSet { .. } => "user_set",
            Change::FileRequested { .. } => "file_requested",
            Change::FileUploaded { .. } => "file_uploaded",
            Change::FileCreated { .. } => "file_created",
            Change::FileShared { .. } => "file_shared",
        }
    }

    /// The file this change touches, if any.
    pub fn file_id(&self) -> Option<FileId> {
        match self {
            Change::UserSet { .. } => None,
            Change::FileRequested { file_id, .. }
            | Change::FileUploaded { file_id, .. }
            | Change::FileCreated { file_id, .. }
            | Change::FileShared { file_id, .. } => Some(*file_id),
        }
    }
}
