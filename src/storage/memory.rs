//! In-process session store
//!
//! Transcripts live as long as the process; useful for one-shot questions
//! and tests.

use super::{Role, SessionStore, StoredSession, Turn};
use crate::error::{NextLevelError, Result};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug)]
struct SessionEntry {
    created_at: DateTime<Utc>,
    turns: Vec<Turn>,
}

/// Session store backed by a map behind a lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> NextLevelError {
    NextLevelError::Storage("session lock poisoned".to_string())
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session_id: &str) -> Result<Vec<Turn>> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        Ok(sessions
            .get(session_id)
            .map(|entry| entry.turns.clone())
            .unwrap_or_default())
    }

    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<Turn> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                created_at: Utc::now(),
                turns: Vec::new(),
            });

        let turn = Turn::new(role, content, entry.turns.len() as u64 + 1);
        entry.turns.push(turn.clone());
        Ok(turn)
    }

    async fn list_sessions(&self) -> Result<Vec<StoredSession>> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        let mut list: Vec<StoredSession> = sessions
            .iter()
            .map(|(id, entry)| StoredSession {
                id: id.clone(),
                created_at: entry.created_at,
                updated_at: entry
                    .turns
                    .last()
                    .map(|t| t.created_at)
                    .unwrap_or(entry.created_at),
                turn_count: entry.turns.len(),
            })
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        Ok(sessions.remove(session_id).is_some())
    }
}
