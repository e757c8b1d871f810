//! Game Search tool
//!
//! Semantic path: embed the question, look up the nearest game descriptions
//! and answer strictly from the retrieved context.

use super::{Observation, ToolExecutor, ToolKind};
use crate::agent::synthesizer::AnswerSynthesizer;
use crate::error::Result;
use crate::graph::VectorSearch;
use crate::providers::Provider;

use async_trait::async_trait;
use std::sync::Arc;

/// Reply when no retrieved description answers the question
pub const NO_MATCHES_MESSAGE: &str =
    "I cannot find any game descriptions matching that request.";

/// Vector search over game descriptions
pub struct GameSearchTool {
    provider: Arc<dyn Provider>,
    search: VectorSearch,
    synthesizer: Arc<AnswerSynthesizer>,
}

impl GameSearchTool {
    /// Creates the tool
    pub fn new(
        provider: Arc<dyn Provider>,
        search: VectorSearch,
        synthesizer: Arc<AnswerSynthesizer>,
    ) -> Self {
        Self {
            provider,
            search,
            synthesizer,
        }
    }
}

#[async_trait]
impl ToolExecutor for GameSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GameSearch
    }

    async fn execute(&self, input: &str) -> Result<Observation> {
        let embedding = self.provider.embed(input).await?;

        let hits = match self.search.search(&embedding).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!("Vector search failed: {}", e);
                return Ok(Observation::failed(format!("Error searching game descriptions: {}", e)));
            }
        };

        if hits.is_empty() {
            return Ok(Observation::empty(NO_MATCHES_MESSAGE));
        }

        tracing::debug!("Answering from {} retrieved descriptions", hits.len());
        match self.synthesizer.semantic(input, &hits).await? {
            Some(answer) => Ok(Observation::content(answer)),
            None => Ok(Observation::empty(NO_MATCHES_MESSAGE)),
        }
    }
}
