//! General Chat tool
//!
//! Plain conversational reply for greetings, acknowledgments and
//! clarifying questions.

use super::{Observation, ToolExecutor, ToolKind};
use crate::error::Result;
use crate::prompts::PromptSet;
use crate::providers::{Message, Provider};

use async_trait::async_trait;
use std::sync::Arc;

/// Conversational reply through the language model
pub struct GeneralChatTool {
    provider: Arc<dyn Provider>,
    prompts: Arc<PromptSet>,
}

impl GeneralChatTool {
    /// Creates the tool
    pub fn new(provider: Arc<dyn Provider>, prompts: Arc<PromptSet>) -> Self {
        Self { provider, prompts }
    }
}

#[async_trait]
impl ToolExecutor for GeneralChatTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GeneralChat
    }

    async fn execute(&self, input: &str) -> Result<Observation> {
        let messages = [
            Message::system(self.prompts.general_chat()),
            Message::user(input),
        ];
        let reply = self.provider.complete(&messages, &[]).await?.content;
        let reply = reply.trim();

        if reply.is_empty() {
            return Ok(Observation::empty("The conversational reply was empty."));
        }
        Ok(Observation::content(reply))
    }
}
