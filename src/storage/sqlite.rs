use super::types::parse_timestamp;
use super::{Role, SessionStore, StoredSession, Turn};
use crate::error::{NextLevelError, Result};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Session store in a local SQLite file
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create a new store in the user's data directory
    ///
    /// `NEXTLEVELBOT_HISTORY_DB` overrides the location.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("NEXTLEVELBOT_HISTORY_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "nextlevelbot", "nextlevelbot").ok_or_else(|| {
            NextLevelError::Storage("Could not determine data directory".into())
        })?;

        Self::new_with_path(proj_dirs.data_dir().join("history.db"))
    }

    /// Create a store that uses the specified database path
    ///
    /// # Examples
    ///
    /// ```
    /// use nextlevelbot::storage::SqliteStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteStore::new_with_path(dir.path().join("history.db")).unwrap();
    /// assert!(store.db_path().ends_with("history.db"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| NextLevelError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Location of the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .context("Failed to set busy timeout")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;
        Ok(conn)
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS turns (
                session_id TEXT NOT NULL REFERENCES sessions(id),
                seq INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (session_id, seq)
            );",
        )
        .context("Failed to create tables")
        .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get(&self, session_id: &str) -> Result<Vec<Turn>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT seq, role, content, created_at FROM turns
                WHERE session_id = ?
                ORDER BY seq ASC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![session_id], |row| {
                let seq: i64 = row.get(0)?;
                let role: String = row.get(1)?;
                let content: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok((seq, role, content, created_at))
            })
            .context("Failed to query turns")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        let mut turns = Vec::new();
        for row in rows {
            let (seq, role, content, created_at) =
                row.map_err(|e| NextLevelError::Storage(e.to_string()))?;
            turns.push(Turn {
                role: role.parse()?,
                content,
                seq: seq as u64,
                created_at: parse_timestamp(&created_at),
            });
        }
        Ok(turns)
    }

    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<Turn> {
        let mut conn = self.open()?;
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        // IMMEDIATE takes the write lock up front so the seq read below
        // cannot race another appender
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to start transaction")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        tx.execute(
            "INSERT INTO sessions (id, created_at, updated_at) VALUES (?1, ?2, ?2)
            ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at",
            params![session_id, now_str],
        )
        .context("Failed to upsert session")
        .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        let seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM turns WHERE session_id = ?",
                params![session_id],
                |row| row.get(0),
            )
            .context("Failed to allocate sequence number")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        tx.execute(
            "INSERT INTO turns (session_id, seq, role, content, created_at)
            VALUES (?, ?, ?, ?, ?)",
            params![session_id, seq, role.as_str(), content, now_str],
        )
        .context("Failed to insert turn")
        .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        Ok(Turn {
            role,
            content: content.to_string(),
            seq: seq as u64,
            created_at: now,
        })
    }

    async fn list_sessions(&self) -> Result<Vec<StoredSession>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT s.id, s.created_at, s.updated_at, COUNT(t.seq)
                FROM sessions s
                LEFT JOIN turns t ON t.session_id = s.id
                GROUP BY s.id
                ORDER BY s.updated_at DESC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        let sessions = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let created_at: String = row.get(1)?;
                let updated_at: String = row.get(2)?;
                let turn_count: i64 = row.get(3)?;
                Ok(StoredSession {
                    id,
                    created_at: parse_timestamp(&created_at),
                    updated_at: parse_timestamp(&updated_at),
                    turn_count: turn_count as usize,
                })
            })
            .context("Failed to query sessions")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        Ok(sessions.flatten().collect())
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        tx.execute("DELETE FROM turns WHERE session_id = ?", params![session_id])
            .context("Failed to delete turns")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;
        let removed = tx
            .execute("DELETE FROM sessions WHERE id = ?", params![session_id])
            .context("Failed to delete session")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| NextLevelError::Storage(e.to_string()))?;

        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn create_test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let store = SqliteStore::new_with_path(dir.path().join("history.db"))
            .expect("failed to create store");
        (store, dir)
    }

    #[test]
    fn test_init_creates_tables() {
        let (store, _dir) = create_test_store();
        let conn = Connection::open(store.db_path()).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('sessions', 'turns')",
                [],
                |row| row.get(0),
            )
            .expect("query tables");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_append_and_get_preserve_order() {
        let (store, _dir) = create_test_store();
        store.append("s1", Role::User, "Who played Hades?").await.unwrap();
        let second = store.append("s1", Role::Assistant, "- alice").await.unwrap();
        assert_eq!(second.seq, 2);

        let turns = store.get("s1").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].content, "- alice");
    }

    #[tokio::test]
    async fn test_get_missing_session_is_empty() {
        let (store, _dir) = create_test_store();
        assert!(store.get("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_sessions_counts_turns() {
        let (store, _dir) = create_test_store();
        store.append("a", Role::User, "1").await.unwrap();
        store.append("a", Role::Assistant, "2").await.unwrap();
        store.append("b", Role::User, "3").await.unwrap();

        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        let a = sessions.iter().find(|s| s.id == "a").unwrap();
        assert_eq!(a.turn_count, 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.append("a", Role::User, "1").await.unwrap();
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert!(store.get("a").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_never_overwrite() {
        let (store, _dir) = create_test_store();
        let store = Arc::new(store);
        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append("shared", Role::User, &format!("msg {}", i))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let turns = store.get("shared").await.unwrap();
        assert_eq!(turns.len(), 10);
        let seqs: Vec<u64> = turns.iter().map(|t| t.seq).collect();
        assert_eq!(seqs, (1..=10).collect::<Vec<u64>>());
    }

    #[test]
    #[serial]
    fn test_new_respects_env_override() {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("nested").join("history.db");
        env::set_var("NEXTLEVELBOT_HISTORY_DB", db_path.to_string_lossy().to_string());

        let store = SqliteStore::new().expect("new failed with env override");
        assert_eq!(store.db_path(), db_path);
        assert!(db_path.parent().unwrap().exists());

        env::remove_var("NEXTLEVELBOT_HISTORY_DB");
    }
}
