//! Error types for NextLevelBot
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for NextLevelBot operations
///
/// Covers configuration, provider, graph backend, reasoning, and storage
/// failures. An empty backend result is not an error and has no variant
/// here; see [`crate::tools::Observation`].
#[derive(Error, Debug)]
pub enum NextLevelError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language model or embedding provider errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Missing credentials for a provider or the graph database
    #[error("Missing credentials for {0}")]
    MissingCredentials(String),

    /// Query or search failed at the data layer
    #[error("Backend execution error: {0}")]
    BackendExecution(String),

    /// Generated query rejected before execution
    #[error("Query validation failed: {0}")]
    QueryValidation(String),

    /// Model output did not follow the reasoning-step format
    #[error("Malformed reasoning output: {0}")]
    MalformedReasoning(String),

    /// Model named a tool that is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Reasoning cycle exceeded its step or time budget
    #[error("Reasoning budget exhausted: limit={limit}, {message}")]
    BudgetExhausted {
        /// The configured limit that was exceeded
        limit: u64,
        /// Which budget ran out
        message: String,
    },

    /// Session storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for NextLevelBot operations
///
/// Uses `anyhow::Error` so callers can attach context while the domain
/// variants above stay downcastable.
pub type Result<T> = anyhow::Result<T>;
