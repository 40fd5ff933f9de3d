//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for sealdrop. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, Transaction};

use sealdrop_core::{
    Change, CoreError, FileId, FilePayload, FileRecord, FileState, Identity, Ledger, User,
    WrappedKey,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

const STATUS_PENDING: i64 = 0;
const STATUS_UPLOADED: i64 = 1;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All trait operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::info!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> Result<u32> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )?)
        })
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run_blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn commit(&self, change: &Change) -> Result<()> {
        let change = change.clone();

        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            write_change(&tx, &change)?;
            tx.commit()?;
            tracing::debug!(kind = change.kind(), file_id = ?change.file_id(), "committed change");
            Ok(())
        })
        .await
    }

    async fn load(&self) -> Result<Ledger> {
        self.run_blocking(|conn| {
            let users = read_users(conn)?;
            let records = read_records(conn)?;
            let next_file_id: i64 = conn.query_row(
                "SELECT next_file_id FROM ledger_meta WHERE id = 0",
                [],
                |row| row.get(0),
            )?;

            let ledger = Ledger::restore(users, records, to_u64(next_file_id, "next_file_id")?)?;
            tracing::debug!(
                users = ledger.users().len(),
                files = ledger.files().len(),
                next_file_id = ledger.files().next_file_id(),
                "loaded ledger"
            );
            Ok(ledger)
        })
        .await
    }
}

/// Write one change inside an open transaction.
fn write_change(tx: &Transaction<'_>, change: &Change) -> Result<()> {
    match change {
        Change::UserSet { identity, user } => {
            tx.execute(
                "INSERT INTO users (identity, first_name, last_name, public_key)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(identity) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    public_key = excluded.public_key",
                params![
                    identity.as_bytes(),
                    user.first_name,
                    user.last_name,
                    user.public_key,
                ],
            )?;
        }

        Change::FileRequested {
            file_id,
            file_name,
            owner,
            alias,
            requested_at,
        } => {
            tx.execute(
                "INSERT INTO files (file_id, file_name, owner, status, alias, requested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    to_i64(*file_id, "file_id")?,
                    file_name,
                    owner.as_bytes(),
                    STATUS_PENDING,
                    alias,
                    to_i64(*requested_at, "requested_at")?,
                ],
            )?;
            advance_counter(tx, *file_id)?;
        }

        Change::FileUploaded {
            file_id,
            uploaded_at,
            payload,
        } => {
            let updated = tx.execute(
                "UPDATE files SET
                    status = ?2, alias = NULL, uploaded_at = ?3,
                    contents = ?4, file_type = ?5, owner_key = ?6
                 WHERE file_id = ?1 AND status = ?7",
                params![
                    to_i64(*file_id, "file_id")?,
                    STATUS_UPLOADED,
                    to_i64(*uploaded_at, "uploaded_at")?,
                    payload.contents,
                    payload.file_type,
                    payload.owner_key,
                    STATUS_PENDING,
                ],
            )?;
            if updated != 1 {
                return Err(StoreError::InvalidData(format!(
                    "file {} is not pending",
                    file_id
                )));
            }
        }

        Change::FileCreated {
            file_id,
            file_name,
            owner,
            uploaded_at,
            payload,
        } => {
            tx.execute(
                "INSERT INTO files (
                    file_id, file_name, owner, status, uploaded_at,
                    contents, file_type, owner_key
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    to_i64(*file_id, "file_id")?,
                    file_name,
                    owner.as_bytes(),
                    STATUS_UPLOADED,
                    to_i64(*uploaded_at, "uploaded_at")?,
                    payload.contents,
                    payload.file_type,
                    payload.owner_key,
                ],
            )?;
            advance_counter(tx, *file_id)?;
        }

        Change::FileShared {
            file_id,
            recipient,
            wrapped_key,
            ..
        } => {
            tx.execute(
                "INSERT INTO file_shares (file_id, recipient, wrapped_key)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(file_id, recipient) DO UPDATE SET
                    wrapped_key = excluded.wrapped_key",
                params![
                    to_i64(*file_id, "file_id")?,
                    recipient.as_bytes(),
                    wrapped_key,
                ],
            )?;
        }
    }

    Ok(())
}

/// Move the persisted counter past `file_id`.
fn advance_counter(tx: &Transaction<'_>, file_id: FileId) -> Result<()> {
    let next = file_id.checked_add(1).ok_or(CoreError::FileIdExhausted)?;
    tx.execute(
        "UPDATE ledger_meta SET next_file_id = MAX(next_file_id, ?1) WHERE id = 0",
        params![to_i64(next, "next_file_id")?],
    )?;
    Ok(())
}

fn read_users(conn: &Connection) -> Result<Vec<(Identity, User)>> {
    let mut stmt = conn.prepare(
        "SELECT identity, first_name, last_name, public_key FROM users ORDER BY identity",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, Vec<u8>>(0)?,
                User {
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    public_key: row.get(3)?,
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(identity, user)| Ok((Identity::new(identity)?, user)))
        .collect()
}

/// A `files` row before validation.
struct FileRow {
    file_id: i64,
    file_name: String,
    owner: Vec<u8>,
    status: i64,
    alias: Option<String>,
    requested_at: Option<i64>,
    uploaded_at: Option<i64>,
    contents: Option<Vec<u8>>,
    file_type: Option<String>,
    owner_key: Option<Vec<u8>>,
}

impl FileRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            file_id: row.get("file_id")?,
            file_name: row.get("file_name")?,
            owner: row.get("owner")?,
            status: row.get("status")?,
            alias: row.get("alias")?,
            requested_at: row.get("requested_at")?,
            uploaded_at: row.get("uploaded_at")?,
            contents: row.get("contents")?,
            file_type: row.get("file_type")?,
            owner_key: row.get("owner_key")?,
        })
    }

    fn into_record(self, shared_with: BTreeMap<Identity, WrappedKey>) -> Result<FileRecord> {
        let file_id = to_u64(self.file_id, "file_id")?;
        let missing = |column: &str| {
            StoreError::InvalidData(format!("file {} has no {}", file_id, column))
        };

        let state = match self.status {
            STATUS_PENDING => FileState::Pending {
                alias: self.alias.ok_or_else(|| missing("alias"))?,
                requested_at: to_u64(
                    self.requested_at.ok_or_else(|| missing("requested_at"))?,
                    "requested_at",
                )?,
            },
            STATUS_UPLOADED => FileState::Uploaded {
                uploaded_at: to_u64(
                    self.uploaded_at.ok_or_else(|| missing("uploaded_at"))?,
                    "uploaded_at",
                )?,
                payload: FilePayload {
                    contents: self.contents.ok_or_else(|| missing("contents"))?,
                    file_type: self.file_type.ok_or_else(|| missing("file_type"))?,
                    owner_key: self.owner_key.ok_or_else(|| missing("owner_key"))?,
                },
            },
            other => {
                return Err(StoreError::InvalidData(format!(
                    "file {} has unknown status {}",
                    file_id, other
                )))
            }
        };

        Ok(FileRecord {
            file_id,
            file_name: self.file_name,
            owner: Identity::new(self.owner)?,
            state,
            shared_with,
        })
    }
}

fn read_records(conn: &Connection) -> Result<Vec<FileRecord>> {
    let mut shares: BTreeMap<i64, BTreeMap<Identity, WrappedKey>> = BTreeMap::new();
    {
        let mut stmt =
            conn.prepare("SELECT file_id, recipient, wrapped_key FROM file_shares")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for (file_id, recipient, wrapped_key) in rows {
            shares
                .entry(file_id)
                .or_default()
                .insert(Identity::new(recipient)?, wrapped_key);
        }
    }

    let mut stmt = conn.prepare("SELECT * FROM files ORDER BY file_id")?;
    let rows = stmt
        .query_map([], FileRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|row| {
            let shared_with = shares.remove(&row.file_id).unwrap_or_default();
            row.into_record(shared_with)
        })
        .collect()
}

fn to_i64(value: u64, column: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{} out of range: {}", column, value)))
}

fn to_u64(value: i64, column: &str) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("negative {}: {}", column, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sealdrop_core::FileStatus;

    fn id(b: u8) -> Identity {
        Identity::new(vec![b]).unwrap()
    }

    fn payload(tag: u8) -> FilePayload {
        FilePayload {
            contents: vec![tag; 4],
            file_type: "application/pdf".to_string(),
            owner_key: vec![tag, 0xee],
        }
    }

    fn history() -> Vec<Change> {
        vec![
            Change::UserSet {
                identity: id(1),
                user: User::new("Ada", "Lovelace", vec![1; 32]),
            },
            Change::UserSet {
                identity: id(2),
                user: User::new("Alan", "Turing", vec![2; 32]),
            },
            Change::FileRequested {
                file_id: 0,
                file_name: "tax return".to_string(),
                owner: id(1),
                alias: "aaaa".to_string(),
                requested_at: 100,
            },
            Change::FileRequested {
                file_id: 1,
                file_name: "passport".to_string(),
                owner: id(1),
                alias: "bbbb".to_string(),
                requested_at: 110,
            },
            Change::FileUploaded {
                file_id: 0,
                uploaded_at: 200,
                payload: payload(7),
            },
            Change::FileCreated {
                file_id: 2,
                file_name: "notes.txt".to_string(),
                owner: id(2),
                uploaded_at: 300,
                payload: payload(8),
            },
            Change::FileShared {
                file_id: 0,
                grantor: id(1),
                recipient: id(2),
                wrapped_key: vec![0x01],
            },
            // Re-sharing replaces the key.
            Change::FileShared {
                file_id: 0,
                grantor: id(1),
                recipient: id(2),
                wrapped_key: vec![0x02],
            },
            Change::UserSet {
                identity: id(2),
                user: User::new("Alan", "M. Turing", vec![3; 32]),
            },
        ]
    }

    async fn commit_all(store: &SqliteStore, changes: &[Change]) {
        for change in changes {
            store.commit(change).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_store_loads_empty_ledger() {
        let store = SqliteStore::open_memory().unwrap();
        let ledger = store.load().await.unwrap();
        assert_eq!(ledger, Ledger::new());
        assert_eq!(store.schema_version().unwrap(), migration::CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_load_matches_replay() {
        let store = SqliteStore::open_memory().unwrap();
        let changes = history();
        commit_all(&store, &changes).await;

        let loaded = store.load().await.unwrap();
        let replayed = Ledger::replay(changes).unwrap();
        assert_eq!(loaded, replayed);

        assert_eq!(loaded.aliases().get("bbbb"), Some(1));
        assert!(loaded.aliases().get("aaaa").is_none());
        assert_eq!(
            loaded.files().get(0).unwrap().shared_with.get(&id(2)),
            Some(&vec![0x02])
        );
        assert_eq!(loaded.users().get(&id(2)).unwrap().last_name, "M. Turing");
        assert_eq!(loaded.files().next_file_id(), 3);
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sealdrop.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            commit_all(&store, &history()).await;
        }

        let store = SqliteStore::open(&path).unwrap();
        let ledger = store.load().await.unwrap();
        assert_eq!(ledger, Ledger::replay(history()).unwrap());
        assert_eq!(
            ledger.files().get(1).unwrap().status(),
            FileStatus::Pending {
                alias: "bbbb".to_string(),
                requested_at: 110
            }
        );
    }

    #[tokio::test]
    async fn test_upload_of_non_pending_rolls_back() {
        let store = SqliteStore::open_memory().unwrap();
        commit_all(&store, &history()).await;
        let before = store.load().await.unwrap();

        let err = store
            .commit(&Change::FileUploaded {
                file_id: 2,
                uploaded_at: 999,
                payload: payload(9),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        assert_eq!(store.load().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_duplicate_alias_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        commit_all(&store, &history()[..3]).await;

        let err = store
            .commit(&Change::FileRequested {
                file_id: 5,
                file_name: "again".to_string(),
                owner: id(1),
                alias: "aaaa".to_string(),
                requested_at: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        // The counter did not move.
        assert_eq!(store.load().await.unwrap().files().next_file_id(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_timestamp() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .commit(&Change::FileCreated {
                file_id: 0,
                file_name: "f".to_string(),
                owner: id(1),
                uploaded_at: u64::MAX,
                payload: payload(1),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Any prefix of a valid history loads back to its replay.
        #[test]
        fn prop_prefix_loads_as_replay(len in 0usize..=9) {
            let changes: Vec<Change> = history().into_iter().take(len).collect();
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let loaded = runtime.block_on(async {
                let store = SqliteStore::open_memory().unwrap();
                commit_all(&store, &changes).await;
                store.load().await.unwrap()
            });

            prop_assert_eq!(loaded, Ledger::replay(changes).unwrap());
        }
    }
}
