//! Chat surface
//!
//! [`ChatService`] ties the router to a session store: it reads the
//! transcript, answers, and appends both turns. It never returns an
//! error; failures come back as text starting with [`ERROR_MARKER`].

use crate::agent::{AnswerSynthesizer, Router, RouterOutcome, Termination};
use crate::config::Config;
use crate::error::Result;
use crate::graph::{CypherValidator, GraphClient, GraphSchema, Neo4jClient, VectorSearch};
use crate::prompts::PromptSet;
use crate::providers::{create_provider, Provider};
use crate::storage::{create_session_store, Role, SessionStore};
use crate::tools::{GameSearchTool, GeneralChatTool, GraphInfoTool, ToolRegistry};

use std::sync::Arc;
use tracing::{info, warn};

/// Prefix of every failure shown to the user
pub const ERROR_MARKER: &str = "❌ Error: ";

/// Reply to blank input
pub const EMPTY_INPUT_MESSAGE: &str = "Please type a question about games.";

/// Reply when the conversation store cannot be read or written
pub const STORAGE_UNAVAILABLE_MESSAGE: &str =
    "the conversation history is unavailable right now, please try again.";

/// Answer plus the reasoning that produced it
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub answer: String,
    /// `None` when the router never ran
    pub outcome: Option<RouterOutcome>,
}

impl ChatReply {
    fn failure(message: &str) -> Self {
        Self {
            answer: format!("{}{}", ERROR_MARKER, message),
            outcome: None,
        }
    }
}

/// Builds the three tools over shared clients
///
/// Registration order is the order the tools are listed to the model.
pub fn build_tool_registry(
    config: &Config,
    provider: Arc<dyn Provider>,
    graph: Arc<dyn GraphClient>,
    prompts: Arc<PromptSet>,
    validator: Arc<CypherValidator>,
) -> ToolRegistry {
    let synthesizer = Arc::new(AnswerSynthesizer::new(provider.clone(), prompts.clone()));
    let search = VectorSearch::new(
        graph.clone(),
        config.semantic.index_name.clone(),
        config.semantic.k,
    );

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GeneralChatTool::new(provider.clone(), prompts.clone())));
    registry.register(Arc::new(GameSearchTool::new(
        provider.clone(),
        search,
        synthesizer.clone(),
    )));
    registry.register(Arc::new(GraphInfoTool::new(
        provider,
        graph,
        prompts,
        validator,
        synthesizer,
        config.structured.top_k,
        config.structured.validate_queries,
    )));
    registry
}

/// Session-aware front door to the router
pub struct ChatService {
    router: Router,
    store: Arc<dyn SessionStore>,
    graph: Arc<dyn GraphClient>,
}

impl ChatService {
    /// Creates a service from ready-made parts
    pub fn new(router: Router, store: Arc<dyn SessionStore>, graph: Arc<dyn GraphClient>) -> Self {
        Self {
            router,
            store,
            graph,
        }
    }

    /// Wires provider, graph client, prompts, tools and session store
    ///
    /// # Errors
    ///
    /// Returns error if a client cannot be built (for example missing
    /// credentials) or the session store cannot be opened
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Arc<dyn Provider> = Arc::from(create_provider(&config.provider)?);
        let graph: Arc<dyn GraphClient> = Arc::new(Neo4jClient::new(&config.graph)?);

        let schema = GraphSchema::games();
        let prompts = Arc::new(PromptSet::new(&schema));
        let validator = Arc::new(CypherValidator::new(schema));

        let registry = build_tool_registry(
            config,
            provider.clone(),
            graph.clone(),
            prompts.clone(),
            validator,
        );
        let router = Router::new(provider, registry, prompts, config.agent.clone())?;
        let store = create_session_store(&config.session, graph.clone())?;

        info!(
            "Chat service ready (model provider: {}, sessions: {:?})",
            config.provider.provider_type, config.session.backend
        );
        Ok(Self::new(router, store, graph))
    }

    /// Session store used for transcripts
    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }

    /// Graph client shared with the tools
    pub fn graph(&self) -> Arc<dyn GraphClient> {
        self.graph.clone()
    }

    /// Answers `text` within `session_id`
    pub async fn submit(&self, session_id: &str, text: &str) -> String {
        self.submit_detailed(session_id, text).await.answer
    }

    /// Like [`ChatService::submit`] but keeps the reasoning steps
    pub async fn submit_detailed(&self, session_id: &str, text: &str) -> ChatReply {
        let text = text.trim();
        if text.is_empty() {
            return ChatReply {
                answer: EMPTY_INPUT_MESSAGE.to_string(),
                outcome: None,
            };
        }

        let history = match self.store.get(session_id).await {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to read session {}: {}", session_id, e);
                return ChatReply::failure(STORAGE_UNAVAILABLE_MESSAGE);
            }
        };

        let outcome = self.router.run(&history, text).await;
        let answer = match outcome.termination {
            Termination::UnrecoverableError => format!("{}{}", ERROR_MARKER, outcome.answer),
            _ => outcome.answer.clone(),
        };

        if let Err(e) = self.store.append(session_id, Role::User, text).await {
            warn!("Failed to store user turn: {}", e);
            return ChatReply::failure(STORAGE_UNAVAILABLE_MESSAGE);
        }
        if let Err(e) = self.store.append(session_id, Role::Assistant, &answer).await {
            warn!("Failed to store assistant turn: {}", e);
        }

        ChatReply {
            answer,
            outcome: Some(outcome),
        }
    }
}
