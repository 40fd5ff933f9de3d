//! Read and share predicates.

use sealdrop_core::{
    FileId, FilePayload, FileRecord, FileState, FileStore, Identity, Ledger, UserRegistry,
};

use crate::error::{PermsError, Result};

/// Whether `caller` may read `record`.
pub fn can_read(caller: &Identity, record: &FileRecord) -> bool {
    record.is_owned_by(caller) || record.shared_with.contains_key(caller)
}

/// Whether `caller` may grant others access to `record`.
pub fn can_share(caller: &Identity, record: &FileRecord) -> bool {
    record.is_owned_by(caller)
}

/// The wrapped key that belongs to `caller`.
///
/// The owner gets the uploader-supplied owner key, anyone else their own
/// `shared_with` entry. `None` for pending records and for callers who
/// cannot read.
pub fn key_for<'a>(caller: &Identity, record: &'a FileRecord) -> Option<&'a [u8]> {
    let payload = record.payload()?;
    if record.is_owned_by(caller) {
        return Some(payload.owner_key.as_slice());
    }
    record.shared_with.get(caller).map(Vec::as_slice)
}

/// Outcome of a read check, in the order the checks are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadAccess<'a> {
    /// No record with that id.
    NotFound,
    /// The record is still waiting for its upload.
    NotUploaded,
    /// The caller is neither owner nor recipient.
    Denied,
    /// Read allowed; `key` is wrapped for the caller.
    Granted {
        payload: &'a FilePayload,
        key: &'a [u8],
    },
}

/// Access decisions against one ledger snapshot.
#[derive(Debug, Clone, Copy)]
pub struct AccessControl<'a> {
    users: &'a UserRegistry,
    files: &'a FileStore,
}

impl<'a> AccessControl<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self {
            users: ledger.users(),
            files: ledger.files(),
        }
    }

    /// Decide whether `caller` may download `file_id`.
    ///
    /// A pending record reports `NotUploaded` to every caller, owner included.
    pub fn check_read(&self, caller: &Identity, file_id: FileId) -> ReadAccess<'a> {
        let Some(record) = self.files.get(file_id) else {
            return ReadAccess::NotFound;
        };

        let payload = match &record.state {
            FileState::Pending { .. } => return ReadAccess::NotUploaded,
            FileState::Uploaded { payload, .. } => payload,
        };

        if !can_read(caller, record) {
            return ReadAccess::Denied;
        }

        match key_for(caller, record) {
            Some(key) => ReadAccess::Granted { payload, key },
            None => ReadAccess::Denied,
        }
    }

    /// Check that `caller` may give `recipient` a key for `file_id`.
    pub fn authorize_share(
        &self,
        caller: &Identity,
        file_id: FileId,
        recipient: &Identity,
    ) -> Result<&'a FileRecord> {
        let record = self
            .files
            .get(file_id)
            .ok_or(PermsError::FileNotFound(file_id))?;

        if !can_share(caller, record) {
            return Err(PermsError::NotOwner(file_id));
        }

        if !self.users.contains(recipient) {
            return Err(PermsError::UnknownRecipient(recipient.to_hex()));
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sealdrop_core::{Change, User};

    fn id(b: u8) -> Identity {
        Identity::new(vec![b]).unwrap()
    }

    fn payload() -> FilePayload {
        FilePayload {
            contents: vec![1, 2, 3],
            file_type: "pdf".to_string(),
            owner_key: vec![0xaa],
        }
    }

    /// Owner 1 has a pending file 0 and an uploaded file 1 shared with 2.
    fn ledger() -> Ledger {
        Ledger::replay(vec![
            Change::UserSet {
                identity: id(1),
                user: User::new("Owner", "One", vec![1]),
            },
            Change::UserSet {
                identity: id(2),
                user: User::new("Reader", "Two", vec![2]),
            },
            Change::FileRequested {
                file_id: 0,
                file_name: "pending".to_string(),
                owner: id(1),
                alias: "a0".to_string(),
                requested_at: 1,
            },
            Change::FileCreated {
                file_id: 1,
                file_name: "ready".to_string(),
                owner: id(1),
                uploaded_at: 2,
                payload: payload(),
            },
            Change::FileShared {
                file_id: 1,
                grantor: id(1),
                recipient: id(2),
                wrapped_key: vec![0xbb],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_read_order() {
        let ledger = ledger();
        let access = AccessControl::new(&ledger);

        assert_eq!(access.check_read(&id(1), 9), ReadAccess::NotFound);
        // Pending wins over permission, for everyone.
        assert_eq!(access.check_read(&id(1), 0), ReadAccess::NotUploaded);
        assert_eq!(access.check_read(&id(3), 0), ReadAccess::NotUploaded);
        assert_eq!(access.check_read(&id(3), 1), ReadAccess::Denied);
    }

    #[test]
    fn test_each_reader_gets_own_key() {
        let ledger = ledger();
        let access = AccessControl::new(&ledger);

        match access.check_read(&id(1), 1) {
            ReadAccess::Granted { key, payload } => {
                assert_eq!(key, &[0xaa]);
                assert_eq!(payload.contents, vec![1, 2, 3]);
            }
            other => panic!("unexpected {:?}", other),
        }
        match access.check_read(&id(2), 1) {
            ReadAccess::Granted { key, .. } => assert_eq!(key, &[0xbb]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_authorize_share() {
        let ledger = ledger();
        let access = AccessControl::new(&ledger);

        assert_eq!(
            access.authorize_share(&id(1), 7, &id(2)).unwrap_err(),
            PermsError::FileNotFound(7)
        );
        assert_eq!(
            access.authorize_share(&id(2), 1, &id(1)).unwrap_err(),
            PermsError::NotOwner(1)
        );
        assert!(matches!(
            access.authorize_share(&id(1), 1, &id(5)),
            Err(PermsError::UnknownRecipient(_))
        ));
        assert_eq!(access.authorize_share(&id(1), 0, &id(2)).unwrap().file_id, 0);
    }

    proptest! {
        #[test]
        fn prop_share_implies_read(
            owner in 0u8..8,
            caller in 0u8..8,
            recipients in prop::collection::btree_set(0u8..8, 0..4),
        ) {
            let mut record = sealdrop_core::FileRecord::uploaded(0, "f", id(owner), 0, payload());
            for r in &recipients {
                record.shared_with.insert(id(*r), vec![*r]);
            }
            let caller = id(caller);

            prop_assert_eq!(can_share(&caller, &record), caller == record.owner);
            if can_share(&caller, &record) {
                prop_assert!(can_read(&caller, &record));
            }
            prop_assert_eq!(can_read(&caller, &record), key_for(&caller, &record).is_some());
        }
    }
}
