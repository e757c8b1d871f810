//! Base provider trait and common types for NextLevelBot
//!
//! This module defines the Provider trait that all language model providers
//! must implement, along with the chat message and completion types shared
//! by the reasoning loop, the tools, and the answer synthesizer.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for a chat completion request
///
/// Represents a message sent to, or received from, the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use nextlevelbot::providers::Message;
    ///
    /// let msg = Message::user("Who played Hades?");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use nextlevelbot::providers::Message;
    ///
    /// let msg = Message::system("You are NextLevelBot");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use nextlevelbot::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Completion response containing the generated text and optional usage
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The generated text
    pub content: String,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a new CompletionResponse without usage information
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    /// Create a new CompletionResponse with token usage
    pub fn with_usage(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage: Some(usage),
        }
    }
}

/// Language model provider
///
/// Consumed as a black box: text completion over a message list and text
/// embedding into the vector space of the description index.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Completes a conversation
    ///
    /// # Arguments
    ///
    /// * `messages` - Prompt messages in order
    /// * `stop` - Sequences at which generation should stop
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the response is invalid
    async fn complete(&self, messages: &[Message], stop: &[String]) -> Result<CompletionResponse>;

    /// Embeds text into a vector
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the response has no vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Name of the chat model in use
    fn model_name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("a").role, "user");
        assert_eq!(Message::assistant("b").role, "assistant");
        assert_eq!(Message::system("c").role, "system");
        assert_eq!(Message::system("c").content, "c");
    }

    #[test]
    fn test_message_serializes_role_and_content() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_completion_response_with_usage() {
        let response = CompletionResponse::with_usage("ok", TokenUsage::new(3, 4));
        assert_eq!(response.content, "ok");
        assert_eq!(response.usage.unwrap().total_tokens, 7);
        assert!(CompletionResponse::new("x").usage.is_none());
    }
}
