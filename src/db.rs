//! Durable key-value storage for the catalog

use std::path::Path;

use log::info;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::paths::get_db_path;

/// String-keyed durable store. Every entry is read and written independently.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Writes several entries; implementations should apply them atomically.
    fn write_all(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.write(key, value)?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// SQLite-backed store with a single `kv` table
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens the store at the default application location
    pub fn open_default() -> Result<Self, StorageError> {
        let db_path = get_db_path()?;
        Self::open(&db_path)
    }

    /// Opens (creating if needed) the store at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("[db] Opening catalog store at {:?}", db_path);
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn write_all(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.read("nexlyn_products").unwrap(), None);
    }

    #[test]
    fn write_overwrites_previous_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.write("nexlyn_wa", "1").unwrap();
        store.write("nexlyn_wa", "2").unwrap();
        assert_eq!(store.read("nexlyn_wa").unwrap().as_deref(), Some("2"));
        store.remove("nexlyn_wa").unwrap();
        assert_eq!(store.read("nexlyn_wa").unwrap(), None);
    }

    #[test]
    fn entries_survive_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .write_all(&[("a", "1".to_string()), ("b", "2".to_string())])
                .unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.read("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.read("b").unwrap().as_deref(), Some("2"));
    }
}
