//! Command-line interface definition for NextLevelBot
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, graph
//! statistics, ad-hoc queries, and conversation history.

use crate::config::SessionBackend;
use clap::{Parser, Subcommand};

/// NextLevelBot - gaming assistant over a knowledge graph
///
/// Ask about games, tags, platforms, players, and their play behavior.
#[derive(Parser, Debug, Clone)]
#[command(name = "nextlevelbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Override where conversation history is stored (graph, sqlite, memory)
    #[arg(long, env = "NEXTLEVELBOT_SESSION_BACKEND", value_parser = parse_backend)]
    pub session_backend: Option<SessionBackend>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

fn parse_backend(value: &str) -> Result<SessionBackend, String> {
    value.parse::<SessionBackend>().map_err(|e| e.to_string())
}

/// Available commands for NextLevelBot
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Resume or name a session; a fresh one is derived when omitted
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,

        /// Session to attach the question to
        #[arg(short, long)]
        session: Option<String>,

        /// Print the reasoning steps after the answer
        #[arg(long)]
        show_steps: bool,
    },

    /// Show node and relationship statistics of the graph
    Stats {
        /// Number of label and relationship types to list
        #[arg(short, long, default_value_t = 5)]
        top: usize,
    },

    /// Run a read-only Cypher query and show the first rows
    Query {
        /// Cypher query text
        cypher: String,

        /// Number of rows to display
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Manage conversation history
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// Conversation history subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List stored sessions
    List,

    /// Print the transcript of a session
    Show {
        /// Session identifier
        id: String,
    },

    /// Delete a stored session
    Delete {
        /// Session identifier
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            session_backend: None,
            command: Commands::Chat { session: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Chat { session: None }));
    }

    #[test]
    fn test_cli_parse_chat_with_session() {
        let cli = Cli::try_parse_from(["nextlevelbot", "chat", "--session", "abc"]).unwrap();
        if let Commands::Chat { session } = cli.command {
            assert_eq!(session, Some("abc".to_string()));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_ask() {
        let cli = Cli::try_parse_from([
            "nextlevelbot",
            "ask",
            "Who played Stardew Valley?",
            "--show-steps",
        ])
        .unwrap();
        if let Commands::Ask {
            question,
            session,
            show_steps,
        } = cli.command
        {
            assert_eq!(question, "Who played Stardew Valley?");
            assert!(session.is_none());
            assert!(show_steps);
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_stats_default_top() {
        let cli = Cli::try_parse_from(["nextlevelbot", "stats"]).unwrap();
        assert!(matches!(cli.command, Commands::Stats { top: 5 }));
    }

    #[test]
    fn test_cli_parse_query_with_limit() {
        let cli = Cli::try_parse_from([
            "nextlevelbot",
            "query",
            "MATCH (g:Game) RETURN g.title",
            "--limit",
            "3",
        ])
        .unwrap();
        if let Commands::Query { cypher, limit } = cli.command {
            assert!(cypher.starts_with("MATCH"));
            assert_eq!(limit, 3);
        } else {
            panic!("Expected Query command");
        }
    }

    #[test]
    fn test_cli_parse_history_delete() {
        let cli = Cli::try_parse_from(["nextlevelbot", "history", "delete", "s-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History {
                command: HistoryCommand::Delete { .. }
            }
        ));
    }

    #[test]
    fn test_cli_parse_session_backend() {
        let cli =
            Cli::try_parse_from(["nextlevelbot", "--session-backend", "memory", "stats"]).unwrap();
        assert_eq!(cli.session_backend, Some(SessionBackend::Memory));
    }

    #[test]
    fn test_cli_rejects_unknown_session_backend() {
        let cli = Cli::try_parse_from(["nextlevelbot", "--session-backend", "redis", "stats"]);
        assert!(cli.is_err());
    }
}
