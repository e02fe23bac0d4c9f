use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// A string-keyed storage area backed by SQLite.
///
/// Each entry is a whole value under a key; there is no partial update.
/// The draft collection and the endpoint setting live here as two
/// independent entries.
pub struct LocalStorage {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl LocalStorage {
    /// Open (or create) the storage database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::DirCreation)?;
        }

        let conn = Connection::open(db_path)?;
        tracing::info!("Storage opened at {}", db_path.display());

        let storage = LocalStorage {
            conn,
            db_path: Some(db_path.to_path_buf()),
        };
        storage.init_schema()?;

        Ok(storage)
    }

    /// Storage that lives only as long as this value
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StoreError> {
        let storage = LocalStorage {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Path to the database file, if any
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Replace the value stored under `key` in a single write
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
        Ok(())
    }
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let storage = LocalStorage::in_memory().unwrap();
        assert_eq!(storage.get_item("nope").unwrap(), None);
    }

    #[test]
    fn test_set_replaces_value() {
        let storage = LocalStorage::in_memory().unwrap();
        storage.set_item("k", "one").unwrap();
        storage.set_item("k", "two").unwrap();

        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("two"));

        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("writer.db");

        {
            let storage = LocalStorage::open(&db_path).unwrap();
            storage.set_item("writer_config", "https://example.com/hook").unwrap();
        }

        let storage = LocalStorage::open(&db_path).unwrap();
        assert_eq!(storage.path(), Some(db_path.as_path()));
        assert_eq!(
            storage.get_item("writer_config").unwrap().as_deref(),
            Some("https://example.com/hook")
        );
    }
}
