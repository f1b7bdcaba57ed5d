use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use crate::AgntError;

/// File name of the store inside the data directory.
pub const DB_FILE: &str = "agnt.db";

/// Resolve the store file for a data directory.
pub fn db_path(data_path: &Path) -> PathBuf {
    data_path.join(DB_FILE)
}

/// Open a SQLite connection to the store file.
///
/// Creates the parent directory when missing. Every connection runs in WAL
/// mode so read transactions get a stable snapshot while the single writer
/// commits.
pub fn open_connection(path: &Path) -> Result<Connection, AgntError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}
