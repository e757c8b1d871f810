//! OpenAI-compatible provider implementation for NextLevelBot
//!
//! Talks to `/chat/completions` for text generation and `/embeddings` for
//! the description vector space. Any gateway exposing the same routes can be
//! used by pointing `api_base` at it.

use crate::config::OpenAiConfig;
use crate::error::{Result, NextLevelError};
use crate::providers::{CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI chat completion and embedding provider
///
/// # Examples
///
/// ```no_run
/// use nextlevelbot::config::OpenAiConfig;
/// use nextlevelbot::providers::{Message, OpenAiProvider, Provider};
///
/// # async fn example() -> nextlevelbot::error::Result<()> {
/// let config = OpenAiConfig {
///     api_key: Some("sk-test".to_string()),
///     ..OpenAiConfig::default()
/// };
/// let provider = OpenAiProvider::new(config)?;
/// let completion = provider.complete(&[Message::user("Hello!")], &[]).await?;
/// println!("{}", completion.content);
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
    api_key: String,
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "no_stop_sequences")]
    stop: &'a [String],
}

fn no_stop_sequences(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

/// Request body for `/embeddings`
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider instance
    ///
    /// # Errors
    ///
    /// Returns `NextLevelError::MissingCredentials` when no API key is
    /// configured, or a provider error if the HTTP client cannot be built
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| NextLevelError::MissingCredentials("openai".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("nextlevelbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NextLevelError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized OpenAI provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), route)
    }

    async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenAI request failed: {}", e);
                NextLevelError::Provider(format!("OpenAI request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI returned error {}: {}", status, error_text);
            return Err(NextLevelError::Provider(format!(
                "OpenAI returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, messages: &[Message], stop: &[String]) -> Result<CompletionResponse> {
        let url = self.endpoint("chat/completions");
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stop,
        };

        tracing::debug!("Sending OpenAI request: {} messages", messages.len());

        let response: ChatResponse = self.post_json(&url, &request).await?.json().await.map_err(|e| {
            tracing::error!("Failed to parse OpenAI response: {}", e);
            NextLevelError::Provider(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                NextLevelError::Provider("OpenAI response contained no choices".to_string())
            })?;

        Ok(match response.usage {
            Some(u) => CompletionResponse::with_usage(
                content,
                TokenUsage::new(u.prompt_tokens, u.completion_tokens),
            ),
            None => CompletionResponse::new(content),
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint("embeddings");
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: text,
        };

        let response: EmbeddingResponse =
            self.post_json(&url, &request).await?.json().await.map_err(|e| {
                NextLevelError::Provider(format!("Failed to parse embedding response: {}", e))
            })?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                NextLevelError::Provider("Embedding response contained no vectors".to_string())
                    .into()
            })
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> OpenAiConfig {
        OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            ..OpenAiConfig::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = OpenAiProvider::new(OpenAiConfig::default());
        assert!(result.is_err());
        assert!(result
            .err()
            .unwrap()
            .to_string()
            .contains("Missing credentials"));
    }

    #[test]
    fn test_new_with_api_key() {
        let provider = OpenAiProvider::new(config_with_key()).unwrap();
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let mut config = config_with_key();
        config.api_base = "http://localhost:9999/v1/".to_string();
        let provider = OpenAiProvider::new(config).unwrap();
        assert_eq!(
            provider.endpoint("chat/completions"),
            "http://localhost:9999/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_request_omits_empty_stop() {
        let messages = vec![Message::user("hi")];
        let request = ChatRequest {
            model: "m",
            messages: &messages,
            temperature: 0.0,
            max_tokens: 10,
            stop: &[],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("stop").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }
}
