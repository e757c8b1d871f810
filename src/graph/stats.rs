//! Node and relationship statistics for the shell
//!
//! Statistics are derived for display only; the reasoning loop never reads
//! them.

use super::{first_count, GraphClient};
use crate::error::Result;

use serde::Serialize;
use serde_json::{json, Value};

const NODE_COUNT: &str = "MATCH (n) RETURN count(n) AS count";
const RELATIONSHIP_COUNT: &str = "MATCH ()-[r]->() RETURN count(r) AS count";
const NODE_TYPES: &str = "MATCH (n) RETURN labels(n) AS labels, count(*) AS count \
                          ORDER BY count DESC LIMIT $top";
const RELATIONSHIP_TYPES: &str = "MATCH ()-[r]->() RETURN type(r) AS type, count(*) AS count \
                                  ORDER BY count DESC LIMIT $top";

/// Counts by label and relationship type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStatistics {
    /// Total node count
    pub nodes: u64,
    /// Total relationship count
    pub relationships: u64,
    /// Most frequent label sets with their counts
    pub node_types: Vec<(String, u64)>,
    /// Most frequent relationship types with their counts
    pub relationship_types: Vec<(String, u64)>,
}

impl GraphStatistics {
    /// Collects statistics, listing at most `top` label and relationship types
    ///
    /// # Errors
    ///
    /// Returns error if any of the count queries fails
    pub async fn collect(client: &dyn GraphClient, top: usize) -> Result<Self> {
        let nodes = first_count(&client.run(NODE_COUNT, json!({})).await?, "count");
        let relationships =
            first_count(&client.run(RELATIONSHIP_COUNT, json!({})).await?, "count");

        let node_types = client
            .run(NODE_TYPES, json!({ "top": top }))
            .await?
            .iter()
            .map(|r| (label_name(r.get("labels")), count_of(r.get("count"))))
            .collect();

        let relationship_types = client
            .run(RELATIONSHIP_TYPES, json!({ "top": top }))
            .await?
            .iter()
            .map(|r| {
                (
                    r.get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    count_of(r.get("count")),
                )
            })
            .collect();

        tracing::debug!(nodes, relationships, "Collected graph statistics");

        Ok(Self {
            nodes,
            relationships,
            node_types,
            relationship_types,
        })
    }
}

fn label_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(labels)) if !labels.is_empty() => labels
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(":"),
        Some(Value::String(s)) => s.clone(),
        _ => "(no label)".to_string(),
    }
}

fn count_of(value: Option<&Value>) -> u64 {
    value.and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Record;
    use crate::test_utils::MockGraphClient;

    fn row(pairs: Value) -> Record {
        pairs.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_collect_statistics() {
        let client = MockGraphClient::new();
        client.push_rows(vec![row(json!({"count": 120}))]);
        client.push_rows(vec![row(json!({"count": 300}))]);
        client.push_rows(vec![
            row(json!({"labels": ["Game"], "count": 80})),
            row(json!({"labels": ["User"], "count": 40})),
        ]);
        client.push_rows(vec![row(json!({"type": "PLAYED", "count": 200}))]);

        let stats = GraphStatistics::collect(&client, 5).await.unwrap();
        assert_eq!(stats.nodes, 120);
        assert_eq!(stats.relationships, 300);
        assert_eq!(stats.node_types[0], ("Game".to_string(), 80));
        assert_eq!(stats.relationship_types, vec![("PLAYED".to_string(), 200)]);

        let calls = client.calls();
        assert_eq!(calls[2].1["top"], 5);
    }

    #[tokio::test]
    async fn test_collect_on_empty_graph() {
        let client = MockGraphClient::new();
        let stats = GraphStatistics::collect(&client, 5).await.unwrap();
        assert_eq!(stats, GraphStatistics::default());
    }

    #[test]
    fn test_label_name_variants() {
        assert_eq!(label_name(Some(&json!(["Game", "Indie"]))), "Game:Indie");
        assert_eq!(label_name(Some(&json!([]))), "(no label)");
        assert_eq!(label_name(None), "(no label)");
    }
}
