//! Session store kept in the graph database
//!
//! Each session is a `(:Session)` node owning `(:Message)` nodes through
//! `HAS_MESSAGE`; consecutive messages are chained with `NEXT`.

use super::types::parse_timestamp;
use super::{Role, SessionStore, StoredSession, Turn};
use crate::error::{NextLevelError, Result};
use crate::graph::{GraphClient, Record};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

// The turn_count increment write-locks the session node, so concurrent
// appends to one session serialize inside the database.
const APPEND_QUERY: &str = "MERGE (s:Session {id: $session_id})
ON CREATE SET s.created_at = $now, s.turn_count = 0
SET s.turn_count = s.turn_count + 1, s.updated_at = $now
WITH s
OPTIONAL MATCH (s)-[:HAS_MESSAGE]->(prev:Message {seq: s.turn_count - 1})
CREATE (s)-[:HAS_MESSAGE]->(m:Message {seq: s.turn_count, role: $role, content: $content, created_at: $now})
FOREACH (_ IN CASE WHEN prev IS NULL THEN [] ELSE [1] END | CREATE (prev)-[:NEXT]->(m))
RETURN m.seq AS seq";

const GET_QUERY: &str = "MATCH (:Session {id: $session_id})-[:HAS_MESSAGE]->(m:Message)
RETURN m.seq AS seq, m.role AS role, m.content AS content, m.created_at AS created_at
ORDER BY m.seq ASC";

const LIST_QUERY: &str = "MATCH (s:Session)
OPTIONAL MATCH (s)-[:HAS_MESSAGE]->(m:Message)
RETURN s.id AS id, s.created_at AS created_at, s.updated_at AS updated_at, count(m) AS turn_count
ORDER BY s.updated_at DESC";

const DELETE_QUERY: &str = "MATCH (s:Session {id: $session_id})
OPTIONAL MATCH (s)-[:HAS_MESSAGE]->(m:Message)
DETACH DELETE m, s
RETURN count(DISTINCT s) AS removed";

/// Session store over a [`GraphClient`]
pub struct GraphSessionStore {
    client: Arc<dyn GraphClient>,
}

impl GraphSessionStore {
    /// Creates a store that shares `client` with the rest of the bot
    pub fn new(client: Arc<dyn GraphClient>) -> Self {
        Self { client }
    }
}

fn text_field(record: &Record, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number_field(record: &Record, field: &str) -> Option<u64> {
    record.get(field).and_then(Value::as_u64)
}

#[async_trait]
impl SessionStore for GraphSessionStore {
    async fn get(&self, session_id: &str) -> Result<Vec<Turn>> {
        let rows = self
            .client
            .run(GET_QUERY, json!({ "session_id": session_id }))
            .await?;

        rows.iter()
            .map(|row| -> Result<Turn> {
                let seq = number_field(row, "seq").ok_or_else(|| {
                    NextLevelError::Storage(format!("Message in {} has no sequence", session_id))
                })?;
                Ok(Turn {
                    role: text_field(row, "role").parse()?,
                    content: text_field(row, "content"),
                    seq,
                    created_at: parse_timestamp(&text_field(row, "created_at")),
                })
            })
            .collect()
    }

    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<Turn> {
        let now = Utc::now();
        let rows = self
            .client
            .run(
                APPEND_QUERY,
                json!({
                    "session_id": session_id,
                    "role": role.as_str(),
                    "content": content,
                    "now": now.to_rfc3339(),
                }),
            )
            .await?;

        let seq = rows
            .first()
            .and_then(|row| number_field(row, "seq"))
            .ok_or_else(|| {
                NextLevelError::Storage(format!("Append to {} returned no sequence", session_id))
            })?;

        Ok(Turn {
            role,
            content: content.to_string(),
            seq,
            created_at: now,
        })
    }

    async fn list_sessions(&self) -> Result<Vec<StoredSession>> {
        let rows = self.client.run(LIST_QUERY, json!({})).await?;
        Ok(rows
            .iter()
            .map(|row| StoredSession {
                id: text_field(row, "id"),
                created_at: parse_timestamp(&text_field(row, "created_at")),
                updated_at: parse_timestamp(&text_field(row, "updated_at")),
                turn_count: number_field(row, "turn_count").unwrap_or(0) as usize,
            })
            .collect())
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let rows = self
            .client
            .run(DELETE_QUERY, json!({ "session_id": session_id }))
            .await?;
        Ok(rows
            .first()
            .and_then(|row| number_field(row, "removed"))
            .unwrap_or(0)
            > 0)
    }
}
