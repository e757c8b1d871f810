//! Tools module for NextLevelBot
//!
//! This module contains the closed set of tools the reasoning loop can
//! invoke, the observation type they produce, and the ordered registry
//! handed to the router.

pub mod game_search;
pub mod general_chat;
pub mod graph_info;

pub use game_search::GameSearchTool;
pub use general_chat::GeneralChatTool;
pub use graph_info::GraphInfoTool;

use crate::error::{NextLevelError, Result};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The tools available to the reasoning loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Conversational reply for acknowledgments and clarifications
    GeneralChat,
    /// Semantic search over game descriptions
    GameSearch,
    /// Structured query against the graph
    GraphInfo,
}

impl ToolKind {
    /// Every tool in registry order
    pub const ALL: [ToolKind; 3] = [
        ToolKind::GeneralChat,
        ToolKind::GameSearch,
        ToolKind::GraphInfo,
    ];

    /// Name the model uses in `Action:` lines
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GeneralChat => "General Chat",
            ToolKind::GameSearch => "Game Search",
            ToolKind::GraphInfo => "Graph Info",
        }
    }

    /// Description shown to the model
    pub fn description(self) -> &'static str {
        match self {
            ToolKind::GeneralChat => {
                "For basic acknowledgments, greetings, or clarifying questions. Never for data questions."
            }
            ToolKind::GameSearch => {
                "Use this tool to find video games based on their descriptions, themes, or similarity to other games."
            }
            ToolKind::GraphInfo => {
                "Use this for database queries about users, games, tags, platforms, reviews, friendships, counts, and filters."
            }
        }
    }

    /// Whether the tool reads from the knowledge graph
    pub fn is_data_tool(self) -> bool {
        !matches!(self, ToolKind::GeneralChat)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = NextLevelError;

    /// Accepts the display name in any case, with surrounding quotes,
    /// brackets or backticks removed
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let cleaned = s
            .trim()
            .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '[' | ']' | '*'))
            .trim();
        ToolKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(cleaned))
            .ok_or_else(|| NextLevelError::UnknownTool(cleaned.to_string()))
    }
}

/// Outcome of one tool invocation
///
/// An empty backend result is a normal observation, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The tool produced content
    Content {
        /// Text shown to the model
        text: String,
        /// Whether the text was cut to fit the observation limit
        truncated: bool,
    },
    /// The backend returned nothing
    Empty(String),
    /// The tool failed; the message is human-readable
    Failed(String),
}

impl Observation {
    /// Creates a content observation
    pub fn content(text: impl Into<String>) -> Self {
        Observation::Content {
            text: text.into(),
            truncated: false,
        }
    }

    /// Creates an empty-result observation
    pub fn empty(message: impl Into<String>) -> Self {
        Observation::Empty(message.into())
    }

    /// Creates a failed observation
    pub fn failed(message: impl Into<String>) -> Self {
        Observation::Failed(message.into())
    }

    /// Whether the observation carries data
    pub fn has_content(&self) -> bool {
        matches!(self, Observation::Content { text, .. } if !text.trim().is_empty())
    }

    /// Whether the observation is a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Observation::Failed(_))
    }

    /// Truncate content if it exceeds the maximum size
    ///
    /// Cuts on a character boundary at or below `max_size` bytes.
    pub fn truncate_if_needed(self, max_size: usize) -> Self {
        match self {
            Observation::Content { mut text, .. } if text.len() > max_size => {
                let mut cut = max_size;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
                text.push_str("\n... (truncated)");
                Observation::Content {
                    text,
                    truncated: true,
                }
            }
            other => other,
        }
    }

    /// Convert to the text fed back after `Observation:`
    pub fn to_message(&self) -> String {
        match self {
            Observation::Content { text, truncated } => {
                if *truncated {
                    format!("{}\n(Output truncated to fit context window)", text)
                } else {
                    text.clone()
                }
            }
            Observation::Empty(message) => message.clone(),
            Observation::Failed(message) => format!("Error: {}", message),
        }
    }
}

/// Tool executor trait for implementing tool execution logic
///
/// # Examples
///
/// ```
/// use nextlevelbot::tools::{Observation, ToolExecutor, ToolKind};
/// use nextlevelbot::error::Result;
/// use async_trait::async_trait;
///
/// struct Echo;
///
/// #[async_trait]
/// impl ToolExecutor for Echo {
///     fn kind(&self) -> ToolKind {
///         ToolKind::GeneralChat
///     }
///
///     async fn execute(&self, input: &str) -> Result<Observation> {
///         Ok(Observation::content(input))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Which tool this executor implements
    fn kind(&self) -> ToolKind;

    /// Executes the tool with the model-provided input text
    ///
    /// # Errors
    ///
    /// Returns error if execution fails; the router records it as a failed
    /// observation
    async fn execute(&self, input: &str) -> Result<Observation>;
}

/// Ordered registry of tool executors
///
/// Holds at most one executor per [`ToolKind`], in registration order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register an executor, replacing any executor of the same kind
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) {
        let kind = executor.kind();
        match self.tools.iter().position(|t| t.kind() == kind) {
            Some(idx) => self.tools[idx] = executor,
            None => self.tools.push(executor),
        }
    }

    /// Get a tool executor by kind
    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.iter().find(|t| t.kind() == kind).cloned()
    }

    /// Registered kinds in order
    pub fn kinds(&self) -> Vec<ToolKind> {
        self.tools.iter().map(|t| t.kind()).collect()
    }

    /// Whether every [`ToolKind`] has an executor
    pub fn is_complete(&self) -> bool {
        ToolKind::ALL.iter().all(|k| self.get(*k).is_some())
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
