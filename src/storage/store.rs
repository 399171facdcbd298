//! Durable storage handle
//!
//! One `HarvestStore` is opened per pipeline run and shared sequentially
//! across stages. Single-statement writes are atomic, which is all the
//! locking discipline the sequential drain loop needs.

use crate::storage::schema::initialize_schema;
use crate::storage::StorageResult;
use rusqlite::Connection;
use std::path::Path;

/// SQLite-backed storage handle shared by the fetch queues and request log
pub struct HarvestStore {
    pub(crate) conn: Connection,
}

impl HarvestStore {
    /// Opens (or creates) the database at the given path
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for durability under interruption
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory() {
        assert!(HarvestStore::new_in_memory().is_ok());
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.db");
        assert!(HarvestStore::new(&path).is_ok());

        // Reopening the same file must succeed (resume path)
        assert!(HarvestStore::new(&path).is_ok());
    }
}
