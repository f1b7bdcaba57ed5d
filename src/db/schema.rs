use crate::db::store::Store;
use crate::AgntError;

/// Version marker written into the metadata partition on first run.
pub const SCHEMA_VERSION: &str = "v1";

/// Metadata partition holding the schema version marker.
pub const META_PARTITION: &str = "__meta";

/// Key of the version marker inside [`META_PARTITION`].
pub const VERSION_KEY: &[u8] = b"version";

/// Chat index partition (one record per chat thread).
pub const CHAT_PARTITION: &str = "chats";

/// Graph node partition.
pub const NODE_PARTITION: &str = "graph:nodes";

/// Graph edge partition.
pub const EDGE_PARTITION: &str = "graph:edges";

/// Name of the message partition owned by a chat.
pub fn message_partition(chat_id: u64) -> String {
    format!("#MESSAGES#{}", chat_id)
}

/// Physical tables backing every partition.
///
/// `partitions` carries one row per partition together with its sequence
/// counter; `records` holds the key/value pairs. Keys compare as raw bytes,
/// so big-endian ids scan in numeric order.
pub(crate) const TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS partitions (
  name TEXT PRIMARY KEY,
  sequence INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS records (
  partition TEXT NOT NULL REFERENCES partitions (name) ON DELETE CASCADE,
  key BLOB NOT NULL,
  value BLOB NOT NULL,
  PRIMARY KEY (partition, key)
) WITHOUT ROWID;
"#;

/// Outcome of the startup version check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The file was empty and has just been initialized.
    Initialized,
    /// The file already carried the expected marker.
    Current,
}

/// Verify the version marker, initializing a fresh store in one transaction.
///
/// An absent marker creates the metadata, chat, node and edge partitions and
/// writes [`SCHEMA_VERSION`]. Any other marker value is [`AgntError::Fatal`]:
/// the store is never silently downgraded or reinterpreted.
pub fn ensure_version(store: &Store) -> Result<SchemaStatus, AgntError> {
    let status = store.write(|tx| {
        if !tx.partition_exists(META_PARTITION)? {
            tx.create_partition(META_PARTITION)?;
        }

        match tx.get(META_PARTITION, VERSION_KEY)? {
            None => {
                for partition in [CHAT_PARTITION, NODE_PARTITION, EDGE_PARTITION] {
                    if !tx.partition_exists(partition)? {
                        tx.create_partition(partition)?;
                    }
                }
                tx.put(META_PARTITION, VERSION_KEY, SCHEMA_VERSION.as_bytes())?;
                Ok(SchemaStatus::Initialized)
            }
            Some(marker) if marker == SCHEMA_VERSION.as_bytes() => Ok(SchemaStatus::Current),
            Some(marker) => Err(AgntError::Fatal(format!(
                "unknown store version {:?} (expected {:?})",
                String::from_utf8_lossy(&marker),
                SCHEMA_VERSION
            ))),
        }
    })?;

    if status == SchemaStatus::Initialized {
        tracing::info!("Initialized new store with schema {}", SCHEMA_VERSION);
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_store_is_initialized_then_current() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agnt.db");

        let store = Store::open(&path).unwrap();
        let partitions = store
            .read(|tx| {
                Ok([META_PARTITION, CHAT_PARTITION, NODE_PARTITION, EDGE_PARTITION]
                    .iter()
                    .map(|p| tx.partition_exists(p))
                    .collect::<Result<Vec<_>, _>>()?)
            })
            .unwrap();
        assert!(partitions.into_iter().all(|exists| exists));
        assert_eq!(ensure_version(&store).unwrap(), SchemaStatus::Current);
    }

    #[test]
    fn test_unknown_version_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agnt.db");

        let store = Store::open(&path).unwrap();
        store
            .write(|tx| tx.put(META_PARTITION, VERSION_KEY, b"v9"))
            .unwrap();
        drop(store);

        let err = Store::open(&path).err().expect("open must fail");
        assert!(matches!(err, AgntError::Fatal(_)), "got {err:?}");
    }

    #[test]
    fn test_message_partition_name() {
        assert_eq!(message_partition(7), "#MESSAGES#7");
    }
}
