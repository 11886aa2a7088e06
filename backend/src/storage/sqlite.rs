//! # SQLite Storage
//!
//! `KeyValueStorage` backed by a single `key_values` table. Writes use
//! `INSERT OR REPLACE`, so storing a value overwrites whatever was stored
//! under the same key. An optional quota counts key and value bytes across
//! the whole table, like the other backends.

use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::traits::{entry_size, KeyValueStorage, StorageError};

pub const DATABASE_FILE_NAME: &str = "attendance.db";

pub struct SqliteStorage {
    conn: Mutex<Connection>,
    quota_bytes: Option<usize>,
}

impl SqliteStorage {
    /// Open a database file, creating it and its schema if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::setup_schema(&conn)?;

        info!("Opened SQLite storage at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
            quota_bytes: None,
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::setup_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            quota_bytes: None,
        })
    }

    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn setup_schema(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS key_values (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM key_values WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn();

        if let Some(quota) = self.quota_bytes {
            let others: i64 = conn.query_row(
                "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
                 FROM key_values WHERE key <> ?1",
                params![key],
                |row| row.get(0),
            )?;
            let required = usize::try_from(others)
                .unwrap_or(usize::MAX)
                .saturating_add(entry_size(key, value));
            if required > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }

        conn.execute(
            "INSERT OR REPLACE INTO key_values (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key FROM key_values ORDER BY key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::TestEnvironment;

    #[test]
    fn test_put_and_get_value() {
        let storage = SqliteStorage::open_in_memory().expect("Failed to open database");

        storage.set("test_key", "test_value").expect("Failed to put value");
        let result = storage.get("test_key").expect("Failed to get value");

        assert_eq!(result.as_deref(), Some("test_value"));
        assert!(storage.get("nonexistent_key").unwrap().is_none());
    }

    #[test]
    fn test_put_replace_value() {
        let storage = SqliteStorage::open_in_memory().unwrap();

        storage.set("same_key", "initial_value").unwrap();
        storage.set("same_key", "updated_value").unwrap();

        assert_eq!(storage.get("same_key").unwrap().as_deref(), Some("updated_value"));
        assert_eq!(storage.keys().unwrap().len(), 1);
    }

    #[test]
    fn test_list_keys_in_order() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert!(storage.keys().unwrap().is_empty());

        for (k, v) in [("key2", "value2"), ("key3", "value3"), ("key1", "value1")] {
            storage.set(k, v).unwrap();
        }

        assert_eq!(storage.keys().unwrap(), vec!["key1", "key2", "key3"]);
    }

    #[test]
    fn test_file_database_persists() {
        let env = TestEnvironment::new().unwrap();
        let db_path = env.base_path.join(DATABASE_FILE_NAME);

        {
            let storage = SqliteStorage::open(&db_path).unwrap();
            storage.set("darkMode", "true").unwrap();
        }

        let reopened = SqliteStorage::open(&db_path).unwrap();
        assert_eq!(reopened.get("darkMode").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_quota_counts_whole_table() {
        let storage = SqliteStorage::open_in_memory().unwrap().with_quota(Some(20));

        storage.set("k1", "12345678").unwrap();
        // Replacing a value only counts the new one
        storage.set("k1", "abcdefgh").unwrap();

        let err = storage.set("k2", "0123456789").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { required: 22, quota: 20, .. }));
        assert!(storage.get("k2").unwrap().is_none());
        assert_eq!(storage.get("k1").unwrap().as_deref(), Some("abcdefgh"));
    }
}
