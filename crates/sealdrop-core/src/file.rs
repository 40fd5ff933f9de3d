//! File records and the store that owns them.
//!
//! A record is either waiting for its upload (`Pending`, reachable through
//! its alias) or holds the uploaded ciphertext (`Uploaded`). Content only
//! exists in the `Uploaded` state, so a pending record has nothing to leak.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{FileId, Identity, WrappedKey};

/// Uploaded ciphertext plus the key material the uploader wrapped for the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    pub contents: Vec<u8>,
    pub file_type: String,
    pub owner_key: WrappedKey,
}

/// Lifecycle state of a file record. The only transition is Pending -> Uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Pending {
        alias: String,
        requested_at: u64,
    },
    Uploaded {
        uploaded_at: u64,
        payload: FilePayload,
    },
}

/// Wire view of [`FileState`] without the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    #[serde(rename = "pending")]
    Pending { alias: String, requested_at: u64 },
    #[serde(rename = "uploaded")]
    Uploaded { uploaded_at: u64 },
}

/// A file slot owned by one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub file_id: FileId,
    pub file_name: String,
    pub owner: Identity,
    pub state: FileState,
    /// Recipient -> key wrapped for that recipient. Entries are never removed.
    pub shared_with: BTreeMap<Identity, WrappedKey>,
}

impl FileRecord {
    /// A freshly requested record.
    pub fn pending(
        file_id: FileId,
        file_name: impl Into<String>,
        owner: Identity,
        alias: impl Into<String>,
        requested_at: u64,
    ) -> Self {
        Self {
            file_id,
            file_name: file_name.into(),
            owner,
            state: FileState::Pending {
                alias: alias.into(),
                requested_at,
            },
            shared_with: BTreeMap::new(),
        }
    }

    /// A record created directly in the uploaded state.
    pub fn uploaded(
        file_id: FileId,
        file_name: impl Into<String>,
        owner: Identity,
        uploaded_at: u64,
        payload: FilePayload,
    ) -> Self {
        Self {
            file_id,
            file_name: file_name.into(),
            owner,
            state: FileState::Uploaded {
                uploaded_at,
                payload,
            },
            shared_with: BTreeMap::new(),
        }
    }

    pub fn status(&self) -> FileStatus {
        match &self.state {
            FileState::Pending {
                alias,
                requested_at,
            } => FileStatus::Pending {
                alias: alias.clone(),
                requested_at: *requested_at,
            },
            FileState::Uploaded { uploaded_at, .. } => FileStatus::Uploaded {
                uploaded_at: *uploaded_at,
            },
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, FileState::Pending { .. })
    }

    /// The alias of a pending record.
    pub fn alias(&self) -> Option<&str> {
        match &self.state {
            FileState::Pending { alias, .. } => Some(alias),
            FileState::Uploaded { .. } => None,
        }
    }

    /// The payload of an uploaded record.
    pub fn payload(&self) -> Option<&FilePayload> {
        match &self.state {
            FileState::Pending { .. } => None,
            FileState::Uploaded { payload, .. } => Some(payload),
        }
    }

    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        &self.owner == identity
    }
}

/// The authoritative table of file records.
///
/// Owns the id counter and two secondary indexes (owner -> files and
/// recipient -> files). Mutating methods check first and write second, so a
/// returned error means nothing changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileStore {
    records: BTreeMap<FileId, FileRecord>,
    next_file_id: FileId,
    by_owner: BTreeMap<Identity, BTreeSet<FileId>>,
    by_recipient: BTreeMap<Identity, BTreeSet<FileId>>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next created record will receive.
    ///
    /// Fails once the counter can no longer advance past the returned id.
    pub fn allocate_id(&self) -> Result<FileId> {
        if self.next_file_id == FileId::MAX {
            return Err(CoreError::FileIdExhausted);
        }
        Ok(self.next_file_id)
    }

    /// Raw counter value.
    pub fn next_file_id(&self) -> FileId {
        self.next_file_id
    }

    pub fn get(&self, file_id: FileId) -> Option<&FileRecord> {
        self.records.get(&file_id)
    }

    pub fn contains(&self, file_id: FileId) -> bool {
        self.records.contains_key(&file_id)
    }

    /// Check that `file_id` may be used for a new record.
    pub fn check_new_id(&self, file_id: FileId) -> Result<()> {
        if self.records.contains_key(&file_id) {
            return Err(CoreError::DuplicateFile(file_id));
        }
        if file_id < self.next_file_id {
            return Err(CoreError::StaleFileId {
                file_id,
                next: self.next_file_id,
            });
        }
        if file_id == FileId::MAX {
            return Err(CoreError::FileIdExhausted);
        }
        Ok(())
    }

    /// Insert a new record and advance the counter past its id.
    pub fn insert(&mut self, record: FileRecord) -> Result<()> {
        self.check_new_id(record.file_id)?;

        let file_id = record.file_id;
        self.next_file_id = file_id + 1;
        self.index(&record);
        self.records.insert(file_id, record);
        Ok(())
    }

    /// Transition a pending record to uploaded.
    ///
    /// Returns the alias the record was pending under.
    pub fn mark_uploaded(
        &mut self,
        file_id: FileId,
        uploaded_at: u64,
        payload: FilePayload,
    ) -> Result<String> {
        let record = self
            .records
            .get_mut(&file_id)
            .ok_or(CoreError::UnknownFile(file_id))?;

        let alias = match &record.state {
            FileState::Pending { alias, .. } => alias.clone(),
            FileState::Uploaded { .. } => {
                return Err(CoreError::InvalidTransition {
                    file_id,
                    reason: "file is already uploaded",
                })
            }
        };

        record.state = FileState::Uploaded {
            uploaded_at,
            payload,
        };
        Ok(alias)
    }

    /// Insert or overwrite the wrapped key of `recipient`.
    pub fn share(
        &mut self,
        file_id: FileId,
        recipient: Identity,
        wrapped_key: WrappedKey,
    ) -> Result<()> {
        let record = self
            .records
            .get_mut(&file_id)
            .ok_or(CoreError::UnknownFile(file_id))?;

        record.shared_with.insert(recipient.clone(), wrapped_key);
        self.by_recipient.entry(recipient).or_default().insert(file_id);
        Ok(())
    }

    /// Records owned by `owner`, by ascending id.
    pub fn owned_by<'a>(&'a self, owner: &Identity) -> impl Iterator<Item = &'a FileRecord> + 'a {
        Self::lookup(&self.records, self.by_owner.get(owner))
    }

    /// Records shared with `recipient`, by ascending id.
    pub fn shared_with<'a>(
        &'a self,
        recipient: &Identity,
    ) -> impl Iterator<Item = &'a FileRecord> + 'a {
        Self::lookup(&self.records, self.by_recipient.get(recipient))
    }

    /// All records, by ascending id.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raise the counter to at least `next_file_id`. Never lowers it.
    pub fn raise_next_file_id(&mut self, next_file_id: FileId) {
        self.next_file_id = self.next_file_id.max(next_file_id);
    }

    fn index(&mut self, record: &FileRecord) {
        self.by_owner
            .entry(record.owner.clone())
            .or_default()
            .insert(record.file_id);
        for recipient in record.shared_with.keys() {
            self.by_recipient
                .entry(recipient.clone())
                .or_default()
                .insert(record.file_id);
        }
    }

    fn lookup<'a>(
        records: &'a BTreeMap<FileId, FileRecord>,
        ids: Option<&'a BTreeSet<FileId>>,
    ) -> impl Iterator<Item = &'a FileRecord> + 'a {
        ids.into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(move |id| records.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(b: u8) -> Identity {
        Identity::new(vec![b]).unwrap()
    }

    fn payload() -> FilePayload {
        FilePayload {
            contents: vec![1, 2, 3],
            file_type: "pdf".to_string(),
            owner_key: vec![9, 9],
        }
    }

    #[test]
    fn test_insert_advances_counter() {
        let mut store = FileStore::new();
        assert_eq!(store.allocate_id().unwrap(), 0);

        store
            .insert(FileRecord::pending(0, "a", id(1), "alias-a", 10))
            .unwrap();
        assert_eq!(store.allocate_id().unwrap(), 1);

        // Ids below the counter are never reused.
        let err = store
            .insert(FileRecord::pending(0, "b", id(1), "alias-b", 10))
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateFile(0));
    }

    #[test]
    fn test_stale_id_rejected() {
        let mut store = FileStore::new();
        store.raise_next_file_id(5);
        let err = store
            .insert(FileRecord::pending(3, "a", id(1), "x", 0))
            .unwrap_err();
        assert_eq!(err, CoreError::StaleFileId { file_id: 3, next: 5 });
    }

    #[test]
    fn test_exhaustion() {
        let mut store = FileStore::new();
        store.raise_next_file_id(FileId::MAX);
        assert_eq!(store.allocate_id().unwrap_err(), CoreError::FileIdExhausted);
    }

    #[test]
    fn test_mark_uploaded_once() {
        let mut store = FileStore::new();
        store
            .insert(FileRecord::pending(0, "a", id(1), "alias-a", 10))
            .unwrap();

        let alias = store.mark_uploaded(0, 20, payload()).unwrap();
        assert_eq!(alias, "alias-a");

        let record = store.get(0).unwrap();
        assert_eq!(record.status(), FileStatus::Uploaded { uploaded_at: 20 });
        assert_eq!(record.payload(), Some(&payload()));
        assert!(record.alias().is_none());

        let err = store.mark_uploaded(0, 30, payload()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { file_id: 0, .. }));
        assert_eq!(
            store.get(0).unwrap().status(),
            FileStatus::Uploaded { uploaded_at: 20 }
        );
    }

    #[test]
    fn test_share_indexes_recipient() {
        let mut store = FileStore::new();
        store
            .insert(FileRecord::uploaded(0, "a", id(1), 5, payload()))
            .unwrap();
        store
            .insert(FileRecord::uploaded(1, "b", id(1), 5, payload()))
            .unwrap();

        store.share(1, id(2), vec![7]).unwrap();
        store.share(1, id(2), vec![8]).unwrap();

        let shared: Vec<_> = store.shared_with(&id(2)).map(|r| r.file_id).collect();
        assert_eq!(shared, vec![1]);
        assert_eq!(store.get(1).unwrap().shared_with.get(&id(2)), Some(&vec![8]));

        let owned: Vec<_> = store.owned_by(&id(1)).map(|r| r.file_id).collect();
        assert_eq!(owned, vec![0, 1]);
        assert_eq!(store.owned_by(&id(2)).count(), 0);
    }

    #[test]
    fn test_status_wire_tags() {
        let pending = FileStatus::Pending {
            alias: "abc".to_string(),
            requested_at: 1,
        };
        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["pending"]["alias"], "abc");
        assert_eq!(json["pending"]["requested_at"], 1);

        let uploaded = serde_json::to_value(FileStatus::Uploaded { uploaded_at: 2 }).unwrap();
        assert_eq!(uploaded["uploaded"]["uploaded_at"], 2);
    }
}
