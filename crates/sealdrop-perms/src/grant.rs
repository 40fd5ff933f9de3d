//! Share grants.
//!
//! A grant hands one recipient a copy of the file's content key, wrapped for
//! that recipient by the owner. Grants are keyed by recipient, so granting
//! twice replaces the earlier key instead of adding a second one.

use serde::{Deserialize, Serialize};

use sealdrop_core::{Change, FileId, Identity, WrappedKey};

/// A request to share a file with one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    /// The identity being granted access.
    pub recipient: Identity,

    /// The file being shared.
    pub file_id: FileId,

    /// Content key wrapped for `recipient`. Stored as given.
    pub wrapped_key: WrappedKey,
}

impl ShareGrant {
    pub fn new(recipient: Identity, file_id: FileId, wrapped_key: impl Into<WrappedKey>) -> Self {
        Self {
            recipient,
            file_id,
            wrapped_key: wrapped_key.into(),
        }
    }

    /// The ledger change recording this grant on behalf of `grantor`.
    pub fn into_change(self, grantor: Identity) -> Change {
        Change::FileShared {
            file_id: self.file_id,
            grantor,
            recipient: self.recipient,
            wrapped_key: self.wrapped_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_change() {
        let owner = Identity::new(vec![1]).unwrap();
        let recipient = Identity::new(vec![2]).unwrap();

        let change = ShareGrant::new(recipient.clone(), 4, vec![7, 7]).into_change(owner.clone());
        assert_eq!(
            change,
            Change::FileShared {
                file_id: 4,
                grantor: owner,
                recipient,
                wrapped_key: vec![7, 7],
            }
        );
        assert_eq!(change.file_id(), Some(4));
        assert_eq!(change.kind(), "file_shared");
    }
}
