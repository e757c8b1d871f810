//! Configuration management for NextLevelBot
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Configuration is read once at process start; missing credentials are a
//! startup fault reported by [`Config::validate`].

use crate::error::{Result, NextLevelError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for NextLevelBot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Language model provider configuration (OpenAI, Ollama)
    pub provider: ProviderConfig,
    /// Graph database connection
    #[serde(default)]
    pub graph: GraphConfig,
    /// Reasoning loop behavior
    #[serde(default)]
    pub agent: AgentConfig,
    /// Structured (Cypher) query path
    #[serde(default)]
    pub structured: StructuredConfig,
    /// Semantic (vector) search path
    #[serde(default)]
    pub semantic: SemanticConfig,
    /// Conversation memory backend
    #[serde(default)]
    pub session: SessionConfig,
}

/// Provider configuration
///
/// Specifies which language model provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type")]
    pub provider_type: String,

    /// OpenAI-compatible API configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key; usually supplied through `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat model identifier
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Embedding model identifier
    #[serde(default = "default_openai_embedding_model")]
    pub embedding_model: String,

    /// API base URL (useful for tests and compatible gateways)
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Maximum completion tokens
    #[serde(default = "default_openai_max_tokens")]
    pub max_tokens: u32,
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_max_tokens() -> u32 {
    4000
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            embedding_model: default_openai_embedding_model(),
            api_base: default_openai_api_base(),
            temperature: 0.0,
            max_tokens: default_openai_max_tokens(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Chat model to use
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Embedding model to use
    #[serde(default = "default_ollama_embedding_model")]
    pub embedding_model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            embedding_model: default_ollama_embedding_model(),
        }
    }
}

/// Graph database connection settings
///
/// The database is reached through its HTTP transactional endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// HTTP endpoint of the database server
    #[serde(default = "default_graph_uri")]
    pub uri: String,

    /// Database user
    #[serde(default = "default_graph_username")]
    pub username: String,

    /// Database password; usually supplied through `NEO4J_PASSWORD`
    #[serde(default)]
    pub password: Option<String>,

    /// Database name
    #[serde(default = "default_graph_database")]
    pub database: String,

    /// Request timeout for a single query (seconds)
    #[serde(default = "default_graph_timeout")]
    pub timeout_seconds: u64,
}

fn default_graph_uri() -> String {
    "http://localhost:7474".to_string()
}

fn default_graph_username() -> String {
    "neo4j".to_string()
}

fn default_graph_database() -> String {
    "neo4j".to_string()
}

fn default_graph_timeout() -> u64 {
    30
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: default_graph_uri(),
            username: default_graph_username(),
            password: None,
            database: default_graph_database(),
            timeout_seconds: default_graph_timeout(),
        }
    }
}

/// Reasoning loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum reasoning steps per user message
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Wall-clock budget per user message (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum size of a single observation fed back to the model (bytes)
    #[serde(default = "default_max_observation")]
    pub max_observation_size: usize,
}

fn default_max_steps() -> usize {
    10
}

fn default_timeout() -> u64 {
    60
}

fn default_max_observation() -> usize {
    16_384
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            timeout_seconds: default_timeout(),
            max_observation_size: default_max_observation(),
        }
    }
}

/// Structured query path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredConfig {
    /// Maximum number of records passed to the answer synthesizer
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Validate generated queries against the schema before execution
    #[serde(default = "default_true")]
    pub validate_queries: bool,
}

fn default_top_k() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl Default for StructuredConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            validate_queries: true,
        }
    }
}

/// Semantic search path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Name of the vector index over description embeddings
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Number of nearest neighbours to retrieve
    #[serde(default = "default_neighbours")]
    pub k: usize,
}

fn default_index_name() -> String {
    "gameDescriptions".to_string()
}

fn default_neighbours() -> usize {
    4
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            k: default_neighbours(),
        }
    }
}

/// Where conversation transcripts are kept
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    /// Message nodes in the graph database
    #[default]
    Graph,
    /// Local SQLite file
    Sqlite,
    /// Process memory (lost on exit)
    Memory,
}

impl std::str::FromStr for SessionBackend {
    type Err = NextLevelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "graph" => Ok(Self::Graph),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(NextLevelError::Config(format!(
                "Invalid session backend: {}. Must be one of: graph, sqlite, memory",
                other
            ))),
        }
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Storage backend
    #[serde(default)]
    pub backend: SessionBackend,

    /// SQLite database path; defaults to the user data directory
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig {
                provider_type: "openai".to_string(),
                openai: OpenAiConfig::default(),
                ollama: OllamaConfig::default(),
            },
            graph: GraphConfig::default(),
            agent: AgentConfig::default(),
            structured: StructuredConfig::default(),
            semantic: SemanticConfig::default(),
            session: SessionConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| NextLevelError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| NextLevelError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("NEXTLEVELBOT_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            self.provider.openai.api_key = Some(api_key);
        }

        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.provider.openai.model = model;
        }

        if let Ok(api_base) = std::env::var("OPENAI_API_BASE") {
            self.provider.openai.api_base = api_base;
        }

        if let Ok(host) = std::env::var("NEXTLEVELBOT_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(model) = std::env::var("NEXTLEVELBOT_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }

        if let Ok(uri) = std::env::var("NEO4J_URI") {
            self.graph.uri = uri;
        }

        if let Ok(username) = std::env::var("NEO4J_USERNAME") {
            self.graph.username = username;
        }

        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            self.graph.password = Some(password);
        }

        if let Ok(database) = std::env::var("NEO4J_DATABASE") {
            self.graph.database = database;
        }

        if let Ok(max_steps) = std::env::var("NEXTLEVELBOT_MAX_STEPS") {
            if let Ok(value) = max_steps.parse() {
                self.agent.max_steps = value;
            } else {
                tracing::warn!("Invalid NEXTLEVELBOT_MAX_STEPS: {}", max_steps);
            }
        }

        if let Ok(timeout) = std::env::var("NEXTLEVELBOT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.agent.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid NEXTLEVELBOT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(top_k) = std::env::var("NEXTLEVELBOT_TOP_K") {
            if let Ok(value) = top_k.parse() {
                self.structured.top_k = value;
            } else {
                tracing::warn!("Invalid NEXTLEVELBOT_TOP_K: {}", top_k);
            }
        }

        if let Ok(backend) = std::env::var("NEXTLEVELBOT_SESSION_BACKEND") {
            match backend.parse::<SessionBackend>() {
                Ok(value) => {
                    self.session.backend = value;
                    tracing::debug!(?value, "Env override: NEXTLEVELBOT_SESSION_BACKEND");
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        if let Ok(path) = std::env::var("NEXTLEVELBOT_HISTORY_DB") {
            self.session.sqlite_path = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(backend) = cli.session_backend {
            self.session.backend = backend;
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all values are within acceptable ranges and that the
    /// credentials needed by the selected provider and the graph database
    /// are present.
    ///
    /// # Errors
    ///
    /// Returns `NextLevelError::Config` for out-of-range values and
    /// `NextLevelError::MissingCredentials` for absent secrets
    pub fn validate(&self) -> Result<()> {
        let valid_providers = ["openai", "ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(NextLevelError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.provider.provider_type == "openai"
            && self
                .provider
                .openai
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
        {
            return Err(NextLevelError::MissingCredentials("openai".to_string()).into());
        }

        let graph_url = url::Url::parse(&self.graph.uri).map_err(|e| {
            NextLevelError::Config(format!("graph.uri is not a valid URL: {}", e))
        })?;
        if !matches!(graph_url.scheme(), "http" | "https") {
            return Err(NextLevelError::Config(format!(
                "graph.uri must use the HTTP endpoint (http:// or https://), got {}://",
                graph_url.scheme()
            ))
            .into());
        }

        if self
            .graph
            .password
            .as_deref()
            .map_or(true, |p| p.is_empty())
        {
            return Err(NextLevelError::MissingCredentials("neo4j".to_string()).into());
        }

        if self.agent.max_steps == 0 {
            return Err(
                NextLevelError::Config("max_steps must be greater than 0".to_string()).into(),
            );
        }

        if self.agent.max_steps > 100 {
            return Err(NextLevelError::Config(
                "max_steps must be less than or equal to 100".to_string(),
            )
            .into());
        }

        if self.agent.timeout_seconds == 0 {
            return Err(
                NextLevelError::Config("timeout_seconds must be greater than 0".to_string())
                    .into(),
            );
        }

        if self.structured.top_k == 0 {
            return Err(
                NextLevelError::Config("structured.top_k must be greater than 0".to_string())
                    .into(),
            );
        }

        if self.semantic.k == 0 {
            return Err(
                NextLevelError::Config("semantic.k must be greater than 0".to_string()).into(),
            );
        }

        if self.semantic.index_name.trim().is_empty() {
            return Err(NextLevelError::Config(
                "semantic.index_name cannot be empty".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_config;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.provider_type, "openai");
        assert_eq!(config.agent.max_steps, 10);
        assert_eq!(config.agent.timeout_seconds, 60);
        assert_eq!(config.structured.top_k, 100);
        assert_eq!(config.semantic.index_name, "gameDescriptions");
        assert_eq!(config.session.backend, SessionBackend::Graph);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_missing_openai_key() {
        let mut config = test_config();
        config.provider.openai.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NextLevelError>(),
            Some(NextLevelError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_config_validation_ollama_needs_no_key() {
        let mut config = test_config();
        config.provider.provider_type = "ollama".to_string();
        config.provider.openai.api_key = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_missing_graph_password() {
        let mut config = test_config();
        config.graph.password = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_bolt_uri() {
        let mut config = test_config();
        config.graph.uri = "bolt://localhost:7687".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("HTTP endpoint"));
    }

    #[test]
    fn test_config_validation_invalid_provider() {
        let mut config = test_config();
        config.provider.provider_type = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_max_steps() {
        let mut config = test_config();
        config.agent.max_steps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = test_config();
        config.agent.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_top_k() {
        let mut config = test_config();
        config.structured.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  type: ollama
  ollama:
    host: http://localhost:11434
    model: llama3.2:latest

graph:
  uri: http://graph.internal:7474
  username: reader
  password: secret

agent:
  max_steps: 5
  timeout_seconds: 30

structured:
  top_k: 25

session:
  backend: sqlite
  sqlite_path: /tmp/nextlevelbot.db
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.provider_type, "ollama");
        assert_eq!(config.graph.username, "reader");
        assert_eq!(config.agent.max_steps, 5);
        assert_eq!(config.structured.top_k, 25);
        assert_eq!(config.semantic.k, 4);
        assert_eq!(config.session.backend, SessionBackend::Sqlite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_session_backend_from_str() {
        assert_eq!(
            "SQLite".parse::<SessionBackend>().unwrap(),
            SessionBackend::Sqlite
        );
        assert_eq!(
            "memory".parse::<SessionBackend>().unwrap(),
            SessionBackend::Memory
        );
        assert!("redis".parse::<SessionBackend>().is_err());
    }
}
