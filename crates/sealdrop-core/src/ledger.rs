//! The ledger: UserRegistry + FileStore + AliasIndex as one unit.
//!
//! Every mutation goes through [`Ledger::apply`], which validates the change
//! against the current state before touching anything. A rejected change
//! leaves the ledger exactly as it was.

use crate::alias::AliasIndex;
use crate::change::Change;
use crate::error::{CoreError, Result};
use crate::file::{FileRecord, FileStore};
use crate::types::{FileId, Identity};
use crate::user::{User, UserRegistry};

/// Aggregated exchange state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Ledger {
    users: UserRegistry,
    files: FileStore,
    aliases: AliasIndex,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn aliases(&self) -> &AliasIndex {
        &self.aliases
    }

    /// Check that `change` can be applied to the current state.
    pub fn validate(&self, change: &Change) -> Result<()> {
        match change {
            Change::UserSet { .. } => Ok(()),

            Change::FileRequested { file_id, alias, .. } => {
                self.files.check_new_id(*file_id)?;
                if self.aliases.contains(alias) {
                    return Err(CoreError::AliasInUse);
                }
                Ok(())
            }

            Change::FileUploaded { file_id, .. } => {
                let record = self
                    .files
                    .get(*file_id)
                    .ok_or(CoreError::UnknownFile(*file_id))?;
                match record.alias() {
                    None => Err(CoreError::InvalidTransition {
                        file_id: *file_id,
                        reason: "file is already uploaded",
                    }),
                    Some(alias) if self.aliases.get(alias) != Some(*file_id) => {
                        Err(CoreError::InvalidTransition {
                            file_id: *file_id,
                            reason: "alias is no longer indexed",
                        })
                    }
                    Some(_) => Ok(()),
                }
            }

            Change::FileCreated { file_id, .. } => self.files.check_new_id(*file_id),

            Change::FileShared {
                file_id,
                grantor,
                recipient,
                ..
            } => {
                let record = self
                    .files
                    .get(*file_id)
                    .ok_or(CoreError::UnknownFile(*file_id))?;
                if !record.is_owned_by(grantor) {
                    return Err(CoreError::NotOwner {
                        file_id: *file_id,
                        grantor: grantor.to_hex(),
                    });
                }
                if !self.users.contains(recipient) {
                    return Err(CoreError::UnknownUser(recipient.to_hex()));
                }
                Ok(())
            }
        }
    }

    /// Validate and apply a change.
    pub fn apply(&mut self, change: Change) -> Result<()> {
        self.validate(&change)?;

        // Everything below was checked by `validate`.
        match change {
            Change::UserSet { identity, user } => {
                self.users.set(identity, user);
            }

            Change::FileRequested {
                file_id,
                file_name,
                owner,
                alias,
                requested_at,
            } => {
                let record =
                    FileRecord::pending(file_id, file_name, owner, alias.clone(), requested_at);
                self.files.insert(record)?;
                self.aliases.insert(alias, file_id)?;
            }

            Change::FileUploaded {
                file_id,
                uploaded_at,
                payload,
            } => {
                let alias = self.files.mark_uploaded(file_id, uploaded_at, payload)?;
                self.aliases.remove(&alias);
            }

            Change::FileCreated {
                file_id,
                file_name,
                owner,
                uploaded_at,
                payload,
            } => {
                let record = FileRecord::uploaded(file_id, file_name, owner, uploaded_at, payload);
                self.files.insert(record)?;
            }

            Change::FileShared {
                file_id,
                recipient,
                wrapped_key,
                ..
            } => {
                self.files.share(file_id, recipient, wrapped_key)?;
            }
        }

        Ok(())
    }

    /// Rebuild a ledger by applying `changes` in order.
    pub fn replay(changes: impl IntoIterator<Item = Change>) -> Result<Self> {
        let mut ledger = Self::new();
        for change in changes {
            ledger.apply(change)?;
        }
        Ok(ledger)
    }

    /// Rebuild a ledger from persisted tables.
    ///
    /// The alias index is derived from the pending records. The counter is
    /// raised to `next_file_id` so ids are not reused after a restart.
    pub fn restore(
        users: impl IntoIterator<Item = (Identity, User)>,
        records: impl IntoIterator<Item = FileRecord>,
        next_file_id: FileId,
    ) -> Result<Self> {
        let mut ledger = Self::new();

        for (identity, user) in users {
            ledger.users.set(identity, user);
        }

        let mut records: Vec<FileRecord> = records.into_iter().collect();
        records.sort_by_key(|r| r.file_id);
        for record in records {
            if let Some(alias) = record.alias() {
                ledger.aliases.insert(alias.to_string(), record.file_id)?;
            }
            ledger.files.insert(record)?;
        }
        ledger.files.raise_next_file_id(next_file_id);

        ledger.check_invariants()?;
        Ok(ledger)
    }

    /// Verify the cross-component invariants.
    ///
    /// - every alias points at a record pending under that alias
    /// - every pending record is reachable through its alias
    /// - every recipient of a share is a registered user
    pub fn check_invariants(&self) -> Result<()> {
        for (alias, file_id) in self.aliases.iter() {
            let record = self
                .files
                .get(file_id)
                .ok_or(CoreError::UnknownFile(file_id))?;
            if record.alias() != Some(alias) {
                return Err(CoreError::InvalidTransition {
                    file_id,
                    reason: "indexed alias does not match a pending record",
                });
            }
        }

        for record in self.files.iter() {
            if let Some(alias) = record.alias() {
                if self.aliases.get(alias) != Some(record.file_id) {
                    return Err(CoreError::InvalidTransition {
                        file_id: record.file_id,
                        reason: "pending record has no indexed alias",
                    });
                }
            }
            for recipient in record.shared_with.keys() {
                if !self.users.contains(recipient) {
                    return Err(CoreError::UnknownUser(recipient.to_hex()));
                }
            }
        }

        Ok(())
    }
}
