//! Ollama provider implementation for NextLevelBot
//!
//! This module implements the Provider trait for Ollama, connecting to a local
//! or remote Ollama server for chat completions and embeddings.

use crate::config::OllamaConfig;
use crate::error::{Result, NextLevelError};
use crate::providers::{CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```
/// use nextlevelbot::config::OllamaConfig;
/// use nextlevelbot::providers::OllamaProvider;
///
/// let provider = OllamaProvider::new(OllamaConfig::default());
/// assert!(provider.is_ok());
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama `/api/chat`
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: OllamaOptions<'a>,
}

/// Generation options for Ollama
#[derive(Debug, Serialize)]
struct OllamaOptions<'a> {
    temperature: f32,
    #[serde(skip_serializing_if = "no_stop_sequences")]
    stop: &'a [String],
}

fn no_stop_sequences(stop: &&[String]) -> bool {
    stop.is_empty()
}

/// Response structure from Ollama `/api/chat`
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// Request structure for Ollama `/api/embeddings`
#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("nextlevelbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NextLevelError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.config.host.trim_end_matches('/'), route);
        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            tracing::error!("Ollama request failed: {}", e);
            NextLevelError::Provider(format!("Ollama request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(NextLevelError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(&self, messages: &[Message], stop: &[String]) -> Result<CompletionResponse> {
        let request = OllamaRequest {
            model: &self.config.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: 0.0,
                stop,
            },
        };

        tracing::debug!("Sending Ollama request: {} messages", messages.len());

        let response: OllamaResponse =
            self.post_json("api/chat", &request).await?.json().await.map_err(|e| {
                tracing::error!("Failed to parse Ollama response: {}", e);
                NextLevelError::Provider(format!("Failed to parse Ollama response: {}", e))
            })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            response.done,
            response.prompt_eval_count,
            response.eval_count
        );

        Ok(
            if response.prompt_eval_count > 0 || response.eval_count > 0 {
                CompletionResponse::with_usage(
                    response.message.content,
                    TokenUsage::new(response.prompt_eval_count, response.eval_count),
                )
            } else {
                CompletionResponse::new(response.message.content)
            },
        )
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: &self.config.embedding_model,
            prompt: text,
        };

        let response: OllamaEmbeddingResponse = self
            .post_json("api/embeddings", &request)
            .await?
            .json()
            .await
            .map_err(|e| {
                NextLevelError::Provider(format!("Failed to parse Ollama embedding: {}", e))
            })?;

        if response.embedding.is_empty() {
            return Err(NextLevelError::Provider(
                "Ollama returned an empty embedding".to_string(),
            )
            .into());
        }

        Ok(response.embedding)
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}
