use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NextLevelError;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting
    User,
    /// NextLevelBot
    Assistant,
}

impl Role {
    /// Lowercase name as stored
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = NextLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "human" => Ok(Role::User),
            "assistant" | "ai" => Ok(Role::Assistant),
            other => Err(NextLevelError::Storage(format!("Unknown turn role: {}", other))),
        }
    }
}

/// One message of a session transcript
///
/// Immutable once appended; `seq` is assigned by the store and strictly
/// increases within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker
    pub role: Role,
    /// Message text
    pub content: String,
    /// Position in the session, starting at 1
    pub seq: u64,
    /// When the turn was stored
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn stamped with the current time
    pub fn new(role: Role, content: impl Into<String>, seq: u64) -> Self {
        Self {
            role,
            content: content.into(),
            seq,
            created_at: Utc::now(),
        }
    }
}

/// Metadata for a stored session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// Session identifier
    pub id: String,
    /// When the first turn was stored
    pub created_at: DateTime<Utc>,
    /// When the last turn was stored
    pub updated_at: DateTime<Utc>,
    /// Number of turns in the session
    pub turn_count: usize,
}

/// Parses an RFC 3339 timestamp, falling back to now
pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
