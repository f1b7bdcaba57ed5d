//! Embedded transactional key-value store.
//!
//! The key space is split into named partitions. Each partition owns a
//! monotonic sequence counter and a set of records keyed by byte strings.
//! Integer ids are encoded big-endian so that an ordered scan yields records
//! in ascending id order.
//!
//! Backed by a single SQLite file: one writer connection guarded by a mutex,
//! plus a small pool of reader connections that each see a WAL snapshot.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::connection::open_connection;
use crate::db::schema;
use crate::AgntError;

/// Maximum number of idle reader connections kept around.
const READER_POOL_SIZE: usize = 4;

/// Encode a record id as an 8-byte big-endian key.
pub fn encode_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Decode an 8-byte big-endian key. Returns `None` for keys of any other width.
pub fn decode_id(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Handle to the store file.
///
/// Write transactions are serialized process-wide through `writer`. Read
/// transactions run on pooled connections and may proceed concurrently.
pub struct Store {
    path: PathBuf,
    writer: Mutex<Connection>,
    readers: Mutex<Vec<Connection>>,
}

impl Store {
    /// Open (or create) the store at `path` and verify its schema version.
    ///
    /// A fresh file is initialized with every fixed partition in a single
    /// transaction. A file carrying an unknown version marker is rejected
    /// with [`AgntError::Fatal`].
    pub fn open(path: &Path) -> Result<Self, AgntError> {
        let conn = open_connection(path)?;
        conn.execute_batch(schema::TABLES)?;

        let store = Self {
            path: path.to_path_buf(),
            writer: Mutex::new(conn),
            readers: Mutex::new(Vec::new()),
        };
        schema::ensure_version(&store)?;

        tracing::info!("Store opened at {}", path.display());
        Ok(store)
    }

    /// Run `f` inside a read transaction.
    ///
    /// The transaction sees one consistent snapshot for its whole duration.
    pub fn read<T, F>(&self, f: F) -> Result<T, AgntError>
    where
        F: FnOnce(&ReadTx<'_>) -> Result<T, AgntError>,
    {
        let mut conn = self.checkout_reader()?;
        let result = run_read(&mut conn, f);
        self.return_reader(conn);
        result
    }

    /// Run `f` inside a write transaction.
    ///
    /// Everything `f` does commits together when it returns `Ok`; an `Err`
    /// (or a failed commit) rolls the whole transaction back.
    pub fn write<T, F>(&self, f: F) -> Result<T, AgntError>
    where
        F: FnOnce(&mut WriteTx<'_>) -> Result<T, AgntError>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|_| AgntError::Storage("writer lock poisoned".into()))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut write = WriteTx {
            read: ReadTx { tx },
        };
        let value = f(&mut write)?;
        write.read.tx.commit()?;
        Ok(value)
    }

    fn checkout_reader(&self) -> Result<Connection, AgntError> {
        let pooled = self
            .readers
            .lock()
            .map_err(|_| AgntError::Storage("reader pool lock poisoned".into()))?
            .pop();
        match pooled {
            Some(conn) => Ok(conn),
            None => open_connection(&self.path),
        }
    }

    fn return_reader(&self, conn: Connection) {
        if let Ok(mut pool) = self.readers.lock() {
            if pool.len() < READER_POOL_SIZE {
                pool.push(conn);
            }
        }
    }
}

fn run_read<T, F>(conn: &mut Connection, f: F) -> Result<T, AgntError>
where
    F: FnOnce(&ReadTx<'_>) -> Result<T, AgntError>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
    let read = ReadTx { tx };
    let value = f(&read)?;
    read.tx.finish()?;
    Ok(value)
}

/// Read-only view of the store inside one transaction.
pub struct ReadTx<'a> {
    tx: Transaction<'a>,
}

impl ReadTx<'_> {
    /// Whether a partition with this name exists.
    pub fn partition_exists(&self, partition: &str) -> Result<bool, AgntError> {
        let found: Option<i64> = self
            .tx
            .query_row(
                "SELECT 1 FROM partitions WHERE name = ?1",
                params![partition],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Raw value stored under `key`, if any.
    pub fn get(&self, partition: &str, key: &[u8]) -> Result<Option<Vec<u8>>, AgntError> {
        let value = self
            .tx
            .query_row(
                "SELECT value FROM records WHERE partition = ?1 AND key = ?2",
                params![partition, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Every `(key, value)` pair in the partition, ascending by key.
    pub fn scan(&self, partition: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, AgntError> {
        let mut stmt = self
            .tx
            .prepare_cached("SELECT key, value FROM records WHERE partition = ?1 ORDER BY key ASC")?;
        let rows = stmt.query_map(params![partition], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Decode the JSON record stored under an integer id.
    pub fn get_record<T: DeserializeOwned>(
        &self,
        partition: &str,
        id: u64,
    ) -> Result<Option<T>, AgntError> {
        match self.get(partition, &encode_id(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Decode every JSON record in the partition, ascending by id.
    pub fn scan_records<T: DeserializeOwned>(&self, partition: &str) -> Result<Vec<T>, AgntError> {
        self.scan(partition)?
            .into_iter()
            .map(|(_, value)| serde_json::from_slice(&value).map_err(AgntError::from))
            .collect()
    }
}

/// Read-write view of the store inside one transaction.
///
/// Dereferences to [`ReadTx`] so reads observe the transaction's own writes.
pub struct WriteTx<'a> {
    read: ReadTx<'a>,
}

impl<'a> Deref for WriteTx<'a> {
    type Target = ReadTx<'a>;

    fn deref(&self) -> &Self::Target {
        &self.read
    }
}

impl WriteTx<'_> {
    /// Create an empty partition with its sequence at zero.
    ///
    /// Fails if the partition already exists.
    pub fn create_partition(&mut self, partition: &str) -> Result<(), AgntError> {
        if self.partition_exists(partition)? {
            return Err(AgntError::Storage(format!(
                "partition '{}' already exists",
                partition
            )));
        }
        self.read.tx.execute(
            "INSERT INTO partitions (name, sequence) VALUES (?1, 0)",
            params![partition],
        )?;
        Ok(())
    }

    /// Drop a partition with all of its records and its sequence.
    ///
    /// Returns `false` when the partition did not exist.
    pub fn drop_partition(&mut self, partition: &str) -> Result<bool, AgntError> {
        self.read
            .tx
            .execute("DELETE FROM records WHERE partition = ?1", params![partition])?;
        let removed = self
            .read
            .tx
            .execute("DELETE FROM partitions WHERE name = ?1", params![partition])?;
        Ok(removed > 0)
    }

    /// Advance and return the partition's sequence counter.
    ///
    /// Values start at 1, strictly increase, and are never handed out twice,
    /// even after the records they named are deleted.
    pub fn next_sequence(&mut self, partition: &str) -> Result<u64, AgntError> {
        let next: Option<i64> = self
            .read
            .tx
            .query_row(
                "UPDATE partitions SET sequence = sequence + 1 WHERE name = ?1 RETURNING sequence",
                params![partition],
                |row| row.get(0),
            )
            .optional()?;
        match next {
            Some(value) => u64::try_from(value)
                .map_err(|_| AgntError::Storage(format!("corrupt sequence in '{}'", partition))),
            None => Err(AgntError::Storage(format!(
                "partition '{}' does not exist",
                partition
            ))),
        }
    }

    /// Insert or overwrite a raw value.
    pub fn put(&mut self, partition: &str, key: &[u8], value: &[u8]) -> Result<(), AgntError> {
        self.read.tx.execute(
            "INSERT INTO records (partition, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (partition, key) DO UPDATE SET value = excluded.value",
            params![partition, key, value],
        )?;
        Ok(())
    }

    /// Delete a raw value. Returns whether a record was removed.
    pub fn delete(&mut self, partition: &str, key: &[u8]) -> Result<bool, AgntError> {
        let removed = self.read.tx.execute(
            "DELETE FROM records WHERE partition = ?1 AND key = ?2",
            params![partition, key],
        )?;
        Ok(removed > 0)
    }

    /// Serialize `record` as JSON under an integer id.
    pub fn put_record<T: Serialize>(
        &mut self,
        partition: &str,
        id: u64,
        record: &T,
    ) -> Result<(), AgntError> {
        let bytes = serde_json::to_vec(record)?;
        self.put(partition, &encode_id(id), &bytes)
    }

    /// Delete the record stored under an integer id.
    pub fn delete_record(&mut self, partition: &str, id: u64) -> Result<bool, AgntError> {
        self.delete(partition, &encode_id(id))
    }
}
