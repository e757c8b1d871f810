//! Neo4j client over the HTTP transactional endpoint
//!
//! Statements are sent to `/db/{database}/tx/commit`, so every call runs in
//! its own auto-committed transaction.

use super::{GraphClient, Record};
use crate::config::GraphConfig;
use crate::error::{NextLevelError, Result};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// HTTP client for a Neo4j server
///
/// # Examples
///
/// ```
/// use nextlevelbot::config::GraphConfig;
/// use nextlevelbot::graph::Neo4jClient;
///
/// let config = GraphConfig {
///     password: Some("secret".to_string()),
///     ..GraphConfig::default()
/// };
/// let client = Neo4jClient::new(&config).unwrap();
/// assert_eq!(client.commit_url(), "http://localhost:7474/db/neo4j/tx/commit");
/// ```
pub struct Neo4jClient {
    client: Client,
    commit_url: String,
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl Neo4jClient {
    /// Creates a client from the graph configuration
    ///
    /// # Errors
    ///
    /// Returns `NextLevelError::MissingCredentials` if no password is set
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let password = config
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| NextLevelError::MissingCredentials("neo4j".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("nextlevelbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                NextLevelError::BackendExecution(format!("Failed to create HTTP client: {}", e))
            })?;

        let commit_url = format!(
            "{}/db/{}/tx/commit",
            config.uri.trim_end_matches('/'),
            config.database
        );

        tracing::info!("Initialized graph client: {}", commit_url);

        Ok(Self {
            client,
            commit_url,
            username: config.username.clone(),
            password,
        })
    }

    /// Endpoint statements are committed to
    pub fn commit_url(&self) -> &str {
        &self.commit_url
    }
}

fn rows_to_records(result: StatementResult) -> Vec<Record> {
    let columns = result.columns;
    result
        .data
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .cloned()
                .zip(row.row)
                .collect::<Map<String, Value>>()
        })
        .collect()
}

#[async_trait]
impl GraphClient for Neo4jClient {
    async fn run(&self, cypher: &str, params: Value) -> Result<Vec<Record>> {
        let params = if params.is_null() {
            Value::Object(Map::new())
        } else {
            params
        };
        let body = CommitRequest {
            statements: [Statement {
                statement: cypher,
                parameters: &params,
            }],
        };

        tracing::debug!(cypher = %cypher, "Running graph statement");

        let response = self
            .client
            .post(&self.commit_url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Graph request failed: {}", e);
                NextLevelError::BackendExecution(format!("Graph request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Graph database returned {}: {}", status, error_text);
            return Err(NextLevelError::BackendExecution(format!(
                "Graph database returned {}: {}",
                status, error_text
            ))
            .into());
        }

        let payload: CommitResponse = response.json().await.map_err(|e| {
            NextLevelError::BackendExecution(format!("Failed to parse graph response: {}", e))
        })?;

        if let Some(err) = payload.errors.into_iter().next() {
            tracing::warn!(code = %err.code, "Graph statement failed: {}", err.message);
            return Err(
                NextLevelError::BackendExecution(format!("{}: {}", err.code, err.message)).into(),
            );
        }

        let records = payload
            .results
            .into_iter()
            .next()
            .map(rows_to_records)
            .unwrap_or_default();

        tracing::debug!("Graph statement returned {} rows", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> GraphConfig {
        GraphConfig {
            uri: "http://db.local:7474/".to_string(),
            password: Some("pw".to_string()),
            database: "games".to_string(),
            ..GraphConfig::default()
        }
    }

    #[test]
    fn test_new_requires_password() {
        let result = Neo4jClient::new(&GraphConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_commit_url_uses_database() {
        let client = Neo4jClient::new(&config()).unwrap();
        assert_eq!(client.commit_url(), "http://db.local:7474/db/games/tx/commit");
    }

    #[test]
    fn test_rows_to_records_keeps_column_order() {
        let result: StatementResult = serde_json::from_value(json!({
            "columns": ["u.username", "p.total_playtime"],
            "data": [
                {"row": ["alice", 120], "meta": [null, null]},
                {"row": ["bob", 45], "meta": [null, null]}
            ]
        }))
        .unwrap();

        let records = rows_to_records(result);
        assert_eq!(records.len(), 2);
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, vec!["u.username", "p.total_playtime"]);
        assert_eq!(records[1]["u.username"], "bob");
    }

    #[test]
    fn test_request_body_shape() {
        let params = json!({"k": 4});
        let body = CommitRequest {
            statements: [Statement {
                statement: "RETURN 1",
                parameters: &params,
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["statements"][0]["statement"], "RETURN 1");
        assert_eq!(json["statements"][0]["parameters"]["k"], 4);
    }
}
