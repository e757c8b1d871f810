//! Prompt templates for NextLevelBot
//!
//! All prompts are collected in a [`PromptSet`] that is built once at
//! startup and handed to the router and the tools. Nothing mutates it
//! afterwards.

pub mod agent_prompt;
pub mod answer_prompt;
pub mod cypher_prompt;

use crate::graph::GraphSchema;
use crate::tools::ToolKind;

/// Immutable set of rendered prompt templates
#[derive(Debug, Clone)]
pub struct PromptSet {
    agent: String,
    general_chat: String,
    cypher: String,
    structured_answer: String,
    semantic_answer: String,
}

impl PromptSet {
    /// Builds the prompt set for a schema and the fixed tool list
    ///
    /// # Examples
    ///
    /// ```
    /// use nextlevelbot::graph::GraphSchema;
    /// use nextlevelbot::prompts::PromptSet;
    ///
    /// let prompts = PromptSet::new(&GraphSchema::games());
    /// assert!(prompts.agent().contains("Graph Info"));
    /// assert!(prompts.cypher("Who played Hades?").contains("Question:\nWho played Hades?"));
    /// ```
    pub fn new(schema: &GraphSchema) -> Self {
        let tools: Vec<(&str, &str)> = ToolKind::ALL
            .iter()
            .map(|k| (k.name(), k.description()))
            .collect();

        Self {
            agent: agent_prompt::generate_agent_prompt(&tools),
            general_chat: answer_prompt::GENERAL_CHAT_SYSTEM.to_string(),
            cypher: cypher_prompt::generate_cypher_template(&schema.describe()),
            structured_answer: answer_prompt::STRUCTURED_ANSWER_TEMPLATE.to_string(),
            semantic_answer: answer_prompt::SEMANTIC_ANSWER_TEMPLATE.to_string(),
        }
    }

    /// System prompt for the reasoning loop
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// System prompt for the conversational tool
    pub fn general_chat(&self) -> &str {
        &self.general_chat
    }

    /// Query-generation prompt for `question`
    pub fn cypher(&self, question: &str) -> String {
        self.cypher.replace("{question}", question)
    }

    /// Structured answer prompt for a rendered context and question
    pub fn structured_answer(&self, context: &str, question: &str) -> String {
        // question first so braces inside the context are left alone
        self.structured_answer
            .replace("{question}", question)
            .replace("{context}", context)
    }

    /// System instructions for a semantic answer over `context`
    pub fn semantic_answer(&self, context: &str) -> String {
        self.semantic_answer.replace("{context}", context)
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new(&GraphSchema::games())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_set_agent_lists_all_tools() {
        let prompts = PromptSet::default();
        for kind in ToolKind::ALL {
            assert!(prompts.agent().contains(kind.name()));
        }
    }

    #[test]
    fn test_cypher_prompt_contains_schema() {
        let prompt = PromptSet::default().cypher("Which games are RPGs?");
        assert!(prompt.contains("(:Game)-[:HAS_TAG]->(:Tag)"));
        assert!(prompt.ends_with("Which games are RPGs?\n"));
    }

    #[test]
    fn test_structured_answer_keeps_context_braces() {
        let prompt =
            PromptSet::default().structured_answer("- {\"note\": \"{question}\"}", "What?");
        assert!(prompt.contains("- {\"note\": \"{question}\"}"));
        assert!(prompt.contains("Original question: What?"));
    }

    #[test]
    fn test_semantic_answer_embeds_context() {
        let prompt = PromptSet::default().semantic_answer("Game: Hades");
        assert!(prompt.ends_with("Context:\nGame: Hades"));
    }
}
