//! Session storage
//!
//! A session is an append-only transcript of [`Turn`]s keyed by an id the
//! shell chooses. Three backends implement [`SessionStore`]: the graph
//! database (default), a local SQLite file, and process memory.

pub mod graph;
pub mod memory;
pub mod sqlite;
pub mod types;

pub use graph::GraphSessionStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{Role, StoredSession, Turn};

use crate::config::{SessionBackend, SessionConfig};
use crate::error::Result;
use crate::graph::GraphClient;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Ordered transcript storage keyed by session id
///
/// Implementations allocate `seq` atomically per session: concurrent
/// appends to the same session never overwrite each other.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Turns of `session_id` in order; empty if the session does not exist
    async fn get(&self, session_id: &str) -> Result<Vec<Turn>>;

    /// Appends a turn, creating the session on first use
    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<Turn>;

    /// Every stored session, most recently updated first
    async fn list_sessions(&self) -> Result<Vec<StoredSession>>;

    /// Removes a session; returns whether it existed
    async fn delete(&self, session_id: &str) -> Result<bool>;
}

/// Builds the configured session store
///
/// The graph backend shares `graph` with the query tools.
pub fn create_session_store(
    config: &SessionConfig,
    graph: Arc<dyn GraphClient>,
) -> Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.backend {
        SessionBackend::Graph => Arc::new(GraphSessionStore::new(graph)),
        SessionBackend::Sqlite => match &config.sqlite_path {
            Some(path) => Arc::new(SqliteStore::new_with_path(path.clone())?),
            None => Arc::new(SqliteStore::new()?),
        },
        SessionBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::debug!("Using {:?} session store", config.backend);
    Ok(store)
}

/// Derives a stable session id from shell state
///
/// The same parts always give the same id.
///
/// # Examples
///
/// ```
/// use nextlevelbot::storage::derive_session_id;
///
/// let id = derive_session_id(&["alice", "terminal-1"]);
/// assert!(id.starts_with("nlb-"));
/// assert_eq!(id, derive_session_id(&["alice", "terminal-1"]));
/// ```
pub fn derive_session_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
    format!("nlb-{}", hex)
}
