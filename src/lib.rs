//! NextLevelBot - conversational gaming assistant library
//!
//! NextLevelBot answers questions about video games, players and play
//! behavior from a Neo4j graph. A bounded reasoning loop picks one of three
//! tools per step: a conversational reply, a Cypher query over the graph,
//! or a vector search over game descriptions.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Tool router, reasoning-step parser and answer synthesizer
//! - `tools`: The three tools and their registry
//! - `graph`: Graph client, schema, query validation and vector search
//! - `providers`: Language model and embedding providers (OpenAI, Ollama)
//! - `prompts`: Prompt templates
//! - `storage`: Session transcripts (graph, SQLite, memory)
//! - `chat`: Session-aware chat surface
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use nextlevelbot::cli::Cli;
//! use nextlevelbot::{ChatService, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse_args();
//!     let config = Config::load("config/config.yaml", &cli)?;
//!     config.validate()?;
//!
//!     let service = ChatService::from_config(&config)?;
//!     println!("{}", service.submit("demo", "Who played Stardew Valley?").await);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod graph;
pub mod prompts;
pub mod providers;
pub mod storage;
pub mod tools;

// Re-export commonly used types
pub use agent::{Router, RouterOutcome, Termination};
pub use chat::{ChatService, ERROR_MARKER};
pub use config::Config;
pub use error::{NextLevelError, Result};

#[cfg(test)]
pub mod test_utils;
