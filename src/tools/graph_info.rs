//! Graph Info tool
//!
//! Structured path: the model writes Cypher for the question, the query is
//! cleaned, title literals are normalized, the query is validated against
//! the schema and executed, and the records are synthesized into an answer.
//! Validation and execution failures come back as failed observations.

use super::{Observation, ToolExecutor, ToolKind};
use crate::agent::synthesizer::{AnswerSynthesizer, NO_RESULTS_MESSAGE};
use crate::error::Result;
use crate::graph::title::rewrite_title_literals;
use crate::graph::{CypherValidator, GraphClient};
use crate::prompts::PromptSet;
use crate::providers::{Message, Provider};

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const CYPHER_KEYWORDS: &[&str] = &[
    "MATCH",
    "OPTIONAL MATCH",
    "WITH",
    "UNWIND",
    "CALL",
    "RETURN",
];

/// Structured query tool
pub struct GraphInfoTool {
    provider: Arc<dyn Provider>,
    graph: Arc<dyn GraphClient>,
    prompts: Arc<PromptSet>,
    validator: Arc<CypherValidator>,
    synthesizer: Arc<AnswerSynthesizer>,
    top_k: usize,
    validate_queries: bool,
}

impl GraphInfoTool {
    /// Creates the tool
    ///
    /// # Arguments
    ///
    /// * `top_k` - Maximum number of records handed to synthesis
    /// * `validate_queries` - Whether generated queries are checked before execution
    pub fn new(
        provider: Arc<dyn Provider>,
        graph: Arc<dyn GraphClient>,
        prompts: Arc<PromptSet>,
        validator: Arc<CypherValidator>,
        synthesizer: Arc<AnswerSynthesizer>,
        top_k: usize,
        validate_queries: bool,
    ) -> Self {
        Self {
            provider,
            graph,
            prompts,
            validator,
            synthesizer,
            top_k,
            validate_queries,
        }
    }

    async fn generate_query(&self, question: &str) -> Result<Option<String>> {
        let prompt = self.prompts.cypher(question);
        let raw = self
            .provider
            .complete(&[Message::user(prompt)], &[])
            .await?
            .content;
        Ok(extract_cypher(&raw).map(|q| rewrite_title_literals(&q)))
    }
}

#[async_trait]
impl ToolExecutor for GraphInfoTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GraphInfo
    }

    async fn execute(&self, input: &str) -> Result<Observation> {
        let query = match self.generate_query(input).await? {
            Some(query) => query,
            None => {
                tracing::warn!("Model produced no Cypher for: {}", input);
                return Ok(Observation::failed(
                    "No database query could be generated for this question.",
                ));
            }
        };

        tracing::debug!(cypher = %query, "Generated Cypher");

        if self.validate_queries {
            if let Err(e) = self.validator.validate(&query) {
                tracing::warn!("Rejected generated query: {}", e);
                return Ok(Observation::failed(format!("{} (query: {})", e, query)));
            }
        }

        let mut records = match self.graph.run(&query, json!({})).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Graph query failed: {}", e);
                return Ok(Observation::failed(format!(
                    "Error executing database query: {}",
                    e
                )));
            }
        };

        if records.is_empty() {
            return Ok(Observation::empty(NO_RESULTS_MESSAGE));
        }

        if records.len() > self.top_k {
            tracing::debug!("Capping {} records at top_k={}", records.len(), self.top_k);
            records.truncate(self.top_k);
        }

        let answer = self.synthesizer.structured(input, &records).await?;
        Ok(Observation::content(answer))
    }
}

/// Extracts the Cypher statement from model output
///
/// Strips markdown fences, leading labels such as `Cypher:` and any prose
/// before the first clause keyword or after the first blank line. Returns
/// `None` when no statement is found.
///
/// # Examples
///
/// ```
/// use nextlevelbot::tools::graph_info::extract_cypher;
///
/// let raw = "Here is the query:\n```cypher\nMATCH (g:Game) RETURN g.title;\n```\nHope it helps!";
/// assert_eq!(extract_cypher(raw).as_deref(), Some("MATCH (g:Game) RETURN g.title"));
/// ```
pub fn extract_cypher(raw: &str) -> Option<String> {
    let body = match raw.find("```") {
        Some(start) => {
            let after = &raw[start + 3..];
            // drop a language tag such as ```cypher
            let after = match after.find('\n') {
                Some(nl) if !starts_with_keyword(&after[..nl]) => &after[nl + 1..],
                _ => after,
            };
            match after.find("```") {
                Some(end) => &after[..end],
                None => after,
            }
        }
        None => raw,
    };

    let mut lines = body.lines().map(str::trim_end).skip_while(|line| {
        let line = strip_label(line.trim_start());
        !starts_with_keyword(line)
    });

    let first = strip_label(lines.next()?.trim_start()).to_string();
    let mut statement = vec![first];
    statement.extend(
        lines
            .take_while(|line| !line.trim().is_empty())
            .map(str::to_string),
    );

    let query = statement
        .join("\n")
        .trim()
        .trim_end_matches(';')
        .trim()
        .to_string();

    if query.is_empty() {
        None
    } else {
        Some(query)
    }
}

fn strip_label(line: &str) -> &str {
    for label in ["Cypher:", "cypher:", "Query:", "query:"] {
        if let Some(rest) = line.strip_prefix(label) {
            return rest.trim_start();
        }
    }
    line
}

fn starts_with_keyword(line: &str) -> bool {
    let upper = line.trim_start().to_ascii_uppercase();
    CYPHER_KEYWORDS.iter().any(|k| {
        upper.starts_with(k)
            && upper[k.len()..]
                .chars()
                .next()
                .map_or(true, |c| c.is_whitespace() || c == '(')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockGraphClient, MockProvider};
    use serde_json::Value;

    fn tool(provider: MockProvider, graph: MockGraphClient, top_k: usize) -> GraphInfoTool {
        let provider: Arc<dyn Provider> = Arc::new(provider);
        let prompts = Arc::new(PromptSet::default());
        GraphInfoTool::new(
            provider.clone(),
            Arc::new(graph),
            prompts.clone(),
            Arc::new(CypherValidator::default()),
            Arc::new(AnswerSynthesizer::new(provider, prompts)),
            top_k,
            true,
        )
    }

    fn row(value: Value) -> crate::graph::Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_extract_plain_query() {
        let raw = "MATCH (g:Game)\nRETURN g.title";
        assert_eq!(extract_cypher(raw).unwrap(), raw);
    }

    #[test]
    fn test_extract_strips_prose_and_label() {
        let raw = "Sure!\nCypher: MATCH (g:Game) RETURN g.title\n\nThis lists all games.";
        assert_eq!(extract_cypher(raw).unwrap(), "MATCH (g:Game) RETURN g.title");
    }

    #[test]
    fn test_extract_unlabelled_fence() {
        let raw = "```\nOPTIONAL MATCH (g:Game) RETURN g.title\n```";
        assert_eq!(
            extract_cypher(raw).unwrap(),
            "OPTIONAL MATCH (g:Game) RETURN g.title"
        );
    }

    #[test]
    fn test_extract_nothing() {
        assert_eq!(extract_cypher("I cannot answer that."), None);
        assert_eq!(extract_cypher(""), None);
        assert_eq!(extract_cypher("Matches are fun"), None);
    }

    #[tokio::test]
    async fn test_execute_normalizes_title_and_synthesizes() {
        let provider = MockProvider::new(vec![
            "```cypher\nMATCH (g:Game {title: \"The Witcher 3\"}) RETURN g.price\n```",
            "The Witcher 3 costs 39.99.",
        ]);
        let graph = MockGraphClient::new();
        graph.push_rows(vec![row(serde_json::json!({"g.price": 39.99}))]);
        let t = tool(provider, graph.clone(), 100);

        let obs = t.execute("How much is The Witcher 3?").await.unwrap();
        assert_eq!(obs, Observation::content("The Witcher 3 costs 39.99."));
        assert!(graph.calls()[0].0.contains("Witcher 3, The"));
    }

    #[tokio::test]
    async fn test_execute_rejects_write_query() {
        let provider = MockProvider::new(vec!["MATCH (g:Game) DETACH DELETE g"]);
        let graph = MockGraphClient::new();
        let t = tool(provider, graph.clone(), 100);

        let obs = t.execute("delete everything").await.unwrap();
        assert!(obs.is_failure());
        assert!(obs.to_message().contains("DELETE"));
        assert!(graph.calls().is_empty());
    }

    #[tokio::test]
    async fn test_execute_backend_error_is_failed_observation() {
        let provider = MockProvider::new(vec!["MATCH (g:Game) RETURN g.title"]);
        let graph = MockGraphClient::new();
        graph.push_error("Neo.ClientError.Statement.SyntaxError: bad");
        let t = tool(provider, graph, 100);

        let obs = t.execute("list games").await.unwrap();
        assert!(obs.is_failure());
        assert!(obs.to_message().contains("Error executing database query"));
    }

    #[tokio::test]
    async fn test_execute_empty_result() {
        let provider = MockProvider::new(vec!["MATCH (g:Game {title: 'Nope'}) RETURN g.title"]);
        let t = tool(provider.clone(), MockGraphClient::new(), 100);

        let obs = t.execute("Is Nope a game?").await.unwrap();
        assert_eq!(obs, Observation::empty(NO_RESULTS_MESSAGE));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_caps_records_at_top_k() {
        let provider = MockProvider::new(vec!["MATCH (u:User) RETURN u.username", ""]);
        let graph = MockGraphClient::new();
        graph.push_rows(
            (0..5)
                .map(|i| row(serde_json::json!({"u.username": format!("user{}", i)})))
                .collect(),
        );
        let t = tool(provider, graph, 2);

        let obs = t.execute("list users").await.unwrap();
        assert_eq!(obs, Observation::content("- user0\n- user1"));
    }

    #[tokio::test]
    async fn test_execute_no_query_generated() {
        let provider = MockProvider::new(vec!["I'm not sure."]);
        let t = tool(provider, MockGraphClient::new(), 100);
        let obs = t.execute("?").await.unwrap();
        assert!(obs.is_failure());
    }
}
