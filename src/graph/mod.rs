//! Graph database access for NextLevelBot
//!
//! The knowledge graph holds games, descriptions, tags, platforms, users and
//! reviews. This module provides the narrow query interface used by the
//! tools, the HTTP client for Neo4j, the declared schema, pre-execution query
//! validation, title normalization, vector search and graph statistics.

pub mod neo4j;
pub mod schema;
pub mod stats;
pub mod title;
pub mod validate;
pub mod vector;

pub use neo4j::Neo4jClient;
pub use schema::GraphSchema;
pub use stats::GraphStatistics;
pub use validate::CypherValidator;
pub use vector::{GameMetadata, SearchHit, VectorSearch};

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One result row: column name to JSON value, in projection order
pub type Record = Map<String, Value>;

/// Query execution against the graph database
///
/// Implementations must be safe to share across sessions.
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Runs a Cypher statement with parameters and returns all rows
    ///
    /// # Errors
    ///
    /// Returns `NextLevelError::BackendExecution` when the database rejects
    /// the statement or cannot be reached
    async fn run(&self, cypher: &str, params: Value) -> Result<Vec<Record>>;
}

/// Extracts an integer column from the first record, if present
pub(crate) fn first_count(records: &[Record], column: &str) -> u64 {
    records
        .first()
        .and_then(|r| r.get(column))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_count_reads_column() {
        let mut record = Record::new();
        record.insert("count".to_string(), json!(42));
        assert_eq!(first_count(&[record], "count"), 42);
    }

    #[test]
    fn test_first_count_defaults_to_zero() {
        assert_eq!(first_count(&[], "count"), 0);
        let mut record = Record::new();
        record.insert("count".to_string(), json!("n/a"));
        assert_eq!(first_count(&[record], "count"), 0);
    }
}
