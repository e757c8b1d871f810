//! Provider module for NextLevelBot
//!
//! This module contains the language model abstraction and implementations
//! for OpenAI-compatible APIs and Ollama.

pub mod base;
pub mod ollama;
pub mod openai;

pub use base::{CompletionResponse, Message, Provider, TokenUsage};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, NextLevelError};

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
/// (for example, a missing API key)
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match config.provider_type.as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::new(config.openai.clone())?)),
        "ollama" => Ok(Box::new(OllamaProvider::new(config.ollama.clone())?)),
        other => Err(NextLevelError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OllamaConfig, OpenAiConfig};

    fn provider_config(provider_type: &str) -> ProviderConfig {
        ProviderConfig {
            provider_type: provider_type.to_string(),
            openai: OpenAiConfig {
                api_key: Some("sk-test".to_string()),
                ..OpenAiConfig::default()
            },
            ollama: OllamaConfig::default(),
        }
    }

    #[test]
    fn test_create_provider_invalid_type() {
        assert!(create_provider(&provider_config("invalid")).is_err());
    }

    #[test]
    fn test_create_provider_openai() {
        let provider = create_provider(&provider_config("openai")).unwrap();
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_create_provider_ollama() {
        let provider = create_provider(&provider_config("ollama")).unwrap();
        assert_eq!(provider.model_name(), "llama3.2:latest");
    }
}
