//! Scripted fakes shared by the integration tests

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use nextlevelbot::agent::Router;
use nextlevelbot::chat::{build_tool_registry, ChatService};
use nextlevelbot::config::Config;
use nextlevelbot::error::{NextLevelError, Result};
use nextlevelbot::graph::{CypherValidator, GraphClient, GraphSchema, Record};
use nextlevelbot::prompts::PromptSet;
use nextlevelbot::providers::{CompletionResponse, Message, Provider};
use nextlevelbot::storage::{MemoryStore, SqliteStore};

/// Config that passes validation
#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.openai.api_key = Some("sk-test".to_string());
    config.graph.password = Some("secret".to_string());
    config
}

/// Language model replaying a fixed script
///
/// An optional delay simulates a slow model.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self {
            script: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, messages: &[Message], _stop: &[String]) -> Result<CompletionResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests.lock().unwrap().push(messages.to_vec());
        let reply = self.script.lock().unwrap().pop_front();
        reply
            .map(CompletionResponse::new)
            .ok_or_else(|| NextLevelError::Provider("script exhausted".to_string()).into())
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.25; 8])
    }

    fn model_name(&self) -> String {
        "scripted".to_string()
    }
}

/// Graph database answering by statement shape
///
/// Vector-index calls get `search_rows`; every other statement gets the
/// next entry of `query_rows` (empty once exhausted).
#[derive(Clone, Default)]
pub struct FakeGraph {
    search_rows: Arc<Mutex<Vec<Record>>>,
    query_rows: Arc<Mutex<VecDeque<Vec<Record>>>>,
    statements: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_rows(self, rows: Vec<Record>) -> Self {
        *self.search_rows.lock().unwrap() = rows;
        self
    }

    pub fn push_query_rows(&self, rows: Vec<Record>) {
        self.query_rows.lock().unwrap().push_back(rows);
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphClient for FakeGraph {
    async fn run(&self, cypher: &str, _params: Value) -> Result<Vec<Record>> {
        self.statements.lock().unwrap().push(cypher.to_string());
        if cypher.contains("db.index.vector.queryNodes") {
            return Ok(self.search_rows.lock().unwrap().clone());
        }
        Ok(self.query_rows.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// Builds a record from a JSON object literal
#[allow(dead_code)]
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Semantic search row for a game
#[allow(dead_code)]
pub fn search_row(name: &str, description: &str, tags: &[&str]) -> Record {
    record(serde_json::json!({
        "text": description,
        "score": 0.92,
        "metadata": {
            "name": name,
            "app_id": 413150,
            "tags": tags,
            "platforms": ["Windows", "Mac"],
            "total_players": 2,
            "reviews": []
        }
    }))
}

/// Router over the real tools with scripted clients
#[allow(dead_code)]
pub fn build_router(config: &Config, provider: ScriptedProvider, graph: FakeGraph) -> Router {
    let provider: Arc<dyn Provider> = Arc::new(provider);
    let graph: Arc<dyn GraphClient> = Arc::new(graph);
    let schema = GraphSchema::games();
    let prompts = Arc::new(PromptSet::new(&schema));
    let registry = build_tool_registry(
        config,
        provider.clone(),
        graph,
        prompts.clone(),
        Arc::new(CypherValidator::new(schema)),
    );
    Router::new(provider, registry, prompts, config.agent.clone()).expect("router")
}

/// Chat service with an in-memory session store
#[allow(dead_code)]
pub fn build_service(provider: ScriptedProvider, graph: FakeGraph) -> (ChatService, Arc<MemoryStore>) {
    let config = test_config();
    let graph_client: Arc<dyn GraphClient> = Arc::new(graph.clone());
    let router = build_router(&config, provider, graph);
    let store = Arc::new(MemoryStore::new());
    (ChatService::new(router, store.clone(), graph_client), store)
}

#[allow(dead_code)]
pub fn create_temp_store() -> (SqliteStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("history.db");
    let store = SqliteStore::new_with_path(db_path).expect("failed to create sqlite store with path");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
