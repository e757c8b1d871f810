//! Nearest-neighbour search over game descriptions
//!
//! Descriptions carry a pre-computed embedding indexed by the database's
//! vector index. A search returns the description text, its relevance score
//! and metadata about the owning game.

use super::{GraphClient, Record};
use crate::error::{NextLevelError, Result};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Vector index lookup joined with the owning game's tags, platforms,
/// player count and reviews
pub const RETRIEVAL_QUERY: &str = r#"CALL db.index.vector.queryNodes($index, $k, $embedding)
YIELD node, score
MATCH (game:Game)-[:HAS_DESCRIPTION]->(node)
OPTIONAL MATCH (game)-[:HAS_TAG]->(t:Tag)
OPTIONAL MATCH (game)-[:SUPPORTS]->(p:Platform)
OPTIONAL MATCH (game)<-[:PLAYED]-(u:User)
OPTIONAL MATCH (game)<-[:REVIEWS]-(r:Review)<-[:WROTE_REVIEW]-(reviewer:User)
WITH node, game, score,
     collect(DISTINCT t) AS tags_collected,
     collect(DISTINCT p) AS platforms_collected,
     collect(DISTINCT u) AS users_collected,
     collect(DISTINCT {review: r, reviewer: reviewer}) AS reviews_collected
RETURN node.text AS text,
       score,
       {
         name: game.title,
         app_id: game.app_id,
         tags: [tag IN tags_collected | tag.name],
         platforms: [platform IN platforms_collected | platform.name],
         total_players: size(users_collected),
         reviews: [item IN reviews_collected WHERE item.review IS NOT NULL | {
           user: item.reviewer.username,
           recommended: item.review.is_recommended,
           helpful: item.review.helpful,
           funny: item.review.funny,
           date: item.review.date
         }]
       } AS metadata
ORDER BY score DESC"#;

/// A single review attached to a game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Reviewer username
    #[serde(default)]
    pub user: Option<String>,
    /// Whether the reviewer recommends the game
    #[serde(default)]
    pub recommended: Option<bool>,
    /// Helpful votes
    #[serde(default)]
    pub helpful: Option<i64>,
    /// Funny votes
    #[serde(default)]
    pub funny: Option<i64>,
    /// Review date as stored
    #[serde(default)]
    pub date: Option<Value>,
}

/// Metadata about the game owning a matched description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    /// Game title
    #[serde(default)]
    pub name: Option<String>,
    /// Store application id
    #[serde(default)]
    pub app_id: Option<Value>,
    /// Tag names
    #[serde(default)]
    pub tags: Vec<String>,
    /// Supported platform names
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Number of distinct players
    #[serde(default)]
    pub total_players: u64,
    /// Reviews of the game
    #[serde(default)]
    pub reviews: Vec<ReviewSummary>,
}

/// A matched description with its score and game metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Description text
    pub text: String,
    /// Relevance score reported by the index
    pub score: f64,
    /// Owning game metadata
    pub metadata: GameMetadata,
}

impl SearchHit {
    /// Parses a hit from one row of [`RETRIEVAL_QUERY`]
    ///
    /// # Errors
    ///
    /// Returns `NextLevelError::BackendExecution` if the row is missing
    /// the expected columns
    pub fn from_record(record: Record) -> Result<Self> {
        serde_json::from_value(Value::Object(record)).map_err(|e| {
            NextLevelError::BackendExecution(format!("Unexpected search result row: {}", e)).into()
        })
    }

    /// Renders the hit as a context block for answer synthesis
    pub fn to_context(&self) -> String {
        let meta = &self.metadata;
        let mut lines = vec![format!(
            "Game: {}",
            meta.name.as_deref().unwrap_or("(untitled)")
        )];
        if let Some(app_id) = &meta.app_id {
            lines.push(format!("App ID: {}", app_id));
        }
        if !meta.tags.is_empty() {
            lines.push(format!("Tags: {}", meta.tags.join(", ")));
        }
        if !meta.platforms.is_empty() {
            lines.push(format!("Platforms: {}", meta.platforms.join(", ")));
        }
        lines.push(format!("Total players: {}", meta.total_players));
        if !meta.reviews.is_empty() {
            let recommended = meta
                .reviews
                .iter()
                .filter(|r| r.recommended == Some(true))
                .count();
            lines.push(format!(
                "Reviews: {} ({} recommended)",
                meta.reviews.len(),
                recommended
            ));
        }
        lines.push(format!("Description: {}", self.text.trim()));
        lines.join("\n")
    }
}

/// Vector search against a named index
pub struct VectorSearch {
    client: Arc<dyn GraphClient>,
    index_name: String,
    k: usize,
}

impl VectorSearch {
    /// Creates a search over `index_name` returning up to `k` hits
    pub fn new(client: Arc<dyn GraphClient>, index_name: impl Into<String>, k: usize) -> Self {
        Self {
            client,
            index_name: index_name.into(),
            k,
        }
    }

    /// Finds the descriptions nearest to `embedding`
    ///
    /// # Errors
    ///
    /// Returns `NextLevelError::BackendExecution` if the query fails or a
    /// row cannot be parsed
    pub async fn search(&self, embedding: &[f32]) -> Result<Vec<SearchHit>> {
        let params = json!({
            "index": self.index_name,
            "k": self.k,
            "embedding": embedding,
        });

        let records = self.client.run(RETRIEVAL_QUERY, params).await?;
        tracing::debug!(
            index = %self.index_name,
            "Vector search returned {} hits",
            records.len()
        );

        records.into_iter().map(SearchHit::from_record).collect()
    }
}
