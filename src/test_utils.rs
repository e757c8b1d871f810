//! Test utilities for NextLevelBot
//!
//! Scripted fakes for the language model and the graph database, plus a
//! configuration that passes validation.

use crate::config::Config;
use crate::error::{NextLevelError, Result};
use crate::graph::{GraphClient, Record};
use crate::providers::{CompletionResponse, Message, Provider};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Configuration with credentials filled in
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.openai.api_key = Some("sk-test".to_string());
    config.graph.password = Some("test-password".to_string());
    config
}

#[derive(Default)]
struct ProviderState {
    responses: VecDeque<std::result::Result<String, String>>,
    requests: Vec<Vec<Message>>,
    embeds: usize,
}

/// Language model that replays scripted completions
///
/// Clones share the same script and request log.
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<ProviderState>>,
    fail_all: Option<String>,
}

impl MockProvider {
    /// Creates a provider returning `responses` in order
    pub fn new(responses: Vec<&str>) -> Self {
        let provider = Self::default();
        {
            let mut state = provider.state.lock().unwrap();
            state.responses = responses.into_iter().map(|r| Ok(r.to_string())).collect();
        }
        provider
    }

    /// Creates a provider whose every call fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            fail_all: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Queues a failing completion
    pub fn push_error(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Err(message.to_string()));
    }

    /// Number of completion calls made
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Number of embedding calls made
    pub fn embed_count(&self) -> usize {
        self.state.lock().unwrap().embeds
    }

    /// Messages of every completion call, in order
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], _stop: &[String]) -> Result<CompletionResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(messages.to_vec());
        if let Some(message) = &self.fail_all {
            return Err(NextLevelError::Provider(message.clone()).into());
        }
        match state.responses.pop_front() {
            Some(Ok(content)) => Ok(CompletionResponse::new(content)),
            Some(Err(message)) => Err(NextLevelError::Provider(message).into()),
            None => Err(NextLevelError::Provider("mock script exhausted".to_string()).into()),
        }
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        let mut state = self.state.lock().unwrap();
        state.embeds += 1;
        if let Some(message) = &self.fail_all {
            return Err(NextLevelError::Provider(message.clone()).into());
        }
        Ok(vec![0.1, 0.2, 0.3, 0.4])
    }

    fn model_name(&self) -> String {
        "mock-model".to_string()
    }
}

#[derive(Default)]
struct GraphState {
    responses: VecDeque<std::result::Result<Vec<Record>, String>>,
    default_rows: Vec<Record>,
    calls: Vec<(String, Value)>,
}

/// Graph client that replays scripted rows
///
/// Once the script runs out every call returns the default rows (empty
/// unless set with [`MockGraphClient::with_rows`]).
#[derive(Clone, Default)]
pub struct MockGraphClient {
    state: Arc<Mutex<GraphState>>,
}

impl MockGraphClient {
    /// Creates a client with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client that returns `rows` for every call
    pub fn with_rows(rows: Vec<Record>) -> Self {
        let client = Self::default();
        client.state.lock().unwrap().default_rows = rows;
        client
    }

    /// Queues rows for the next call
    pub fn push_rows(&self, rows: Vec<Record>) {
        self.state.lock().unwrap().responses.push_back(Ok(rows));
    }

    /// Queues a failure for the next call
    pub fn push_error(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Err(message.to_string()));
    }

    /// Every statement and parameter map received, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl GraphClient for MockGraphClient {
    async fn run(&self, cypher: &str, params: Value) -> Result<Vec<Record>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((cypher.to_string(), params));
        match state.responses.pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(NextLevelError::BackendExecution(message).into()),
            None => Ok(state.default_rows.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_config_validates() {
        assert!(test_config().validate().is_ok());
    }

    #[tokio::test]
    async fn test_mock_provider_script() {
        let provider = MockProvider::new(vec!["one"]);
        provider.push_error("two");
        assert_eq!(provider.complete(&[], &[]).await.unwrap().content, "one");
        assert!(provider.complete(&[], &[]).await.is_err());
        assert!(provider.complete(&[], &[]).await.is_err());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_graph_defaults() {
        let client = MockGraphClient::new();
        assert!(client.run("RETURN 1", Value::Null).await.unwrap().is_empty());
        assert_eq!(client.calls().len(), 1);
    }
}
