pub mod notify;

pub use notify::{Notification, StoreHandle, StoreHub, Subscription};

use crate::error::{Result, TombolaError};
use rusqlite::{params, Connection};
use std::path::Path;
use tokio::sync::Mutex;

/// Default per-value capacity. Mirrors the low-single-digit-megabyte limit
/// of browser origin storage; oversized values must be rejected before the
/// write, not discovered by a reader.
pub const DEFAULT_VALUE_LIMIT: usize = 4 * 1024 * 1024;

/// Durable string-keyed store shared by every context of one data directory.
///
/// Values survive any single context's restart. There are no cross-key
/// transactional guarantees: a reader may observe key A updated before key B
/// even when both were written together.
pub struct SharedStore {
    conn: Mutex<Connection>,
    value_limit: usize,
}

impl SharedStore {
    pub async fn open(db_path: &Path) -> Result<Self> {
        Self::open_with_limit(db_path, DEFAULT_VALUE_LIMIT).await
    }

    pub async fn open_with_limit(db_path: &Path, value_limit: usize) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TombolaError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
            value_limit,
        };

        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        if value.len() > self.value_limit {
            return Err(TombolaError::CapacityExceeded {
                key: key.to_string(),
                size: value.len(),
                limit: self.value_limit,
            });
        }

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;

        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;

        let result = conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TombolaError::Storage(e)),
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn set_get_remove() {
        let dir = tempdir().unwrap();
        let store = SharedStore::open(&dir.path().join("kv.db")).await.unwrap();

        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("greeting", "hello").await.unwrap();
        assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("hello"));

        store.set("greeting", "hi").await.unwrap();
        assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("hi"));

        store.remove("greeting").await.unwrap();
        assert_eq!(store.get("greeting").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.db");

        {
            let store = SharedStore::open(&path).await.unwrap();
            store.set("persisted", "yes").await.unwrap();
        }

        let store = SharedStore::open(&path).await.unwrap();
        assert_eq!(store.get("persisted").await.unwrap().as_deref(), Some("yes"));
    }

    #[tokio::test]
    async fn oversized_value_is_rejected_before_write() {
        let dir = tempdir().unwrap();
        let store = SharedStore::open_with_limit(&dir.path().join("kv.db"), 16)
            .await
            .unwrap();

        store.set("small", "ok").await.unwrap();

        let err = store
            .set("big", &"x".repeat(17))
            .await
            .expect_err("expected capacity error");
        assert!(matches!(err, TombolaError::CapacityExceeded { .. }));
        assert_eq!(store.get("big").await.unwrap(), None);
    }
}
