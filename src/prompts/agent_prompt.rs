//! Reasoning-loop prompt
//!
//! Instructs the model to work in `Thought` / `Action` / `Action Input` /
//! `Observation` steps and to finish with `Final Answer`, using only what
//! the tools return.

use crate::storage::{Role, Turn};
use std::fmt::Write as _;

/// Stop sequence that keeps the model from inventing its own observations
pub const OBSERVATION_STOP: &str = "\nObservation:";

/// Generates the system prompt for the reasoning loop
///
/// # Arguments
///
/// * `tools` - `(name, description)` pairs in registry order
///
/// # Examples
///
/// ```
/// use nextlevelbot::prompts::agent_prompt::generate_agent_prompt;
///
/// let prompt = generate_agent_prompt(&[("Graph Info", "Database queries")]);
/// assert!(prompt.contains("NextLevelBot"));
/// assert!(prompt.contains("- Graph Info: Database queries"));
/// ```
pub fn generate_agent_prompt(tools: &[(&str, &str)]) -> String {
    let tool_list = tools
        .iter()
        .map(|(name, description)| format!("- {}: {}", name, description))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = tools
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are NextLevelBot, an intelligent assistant that helps users explore and learn about video games.

Be as helpful as possible and return as much relevant information as you can.
Never use any knowledge that is not returned by a tool.
If the tools do not return any information or return an empty result, you MUST state that you could not find the information in the database.
Do not answer from your own knowledge. Do not guess or make assumptions.
Only answer questions that relate to video games, genres, developers, players, or play patterns.

TOOLS:
------

You have access to the following tools:

{tool_list}

Only use the "General Chat" tool for basic acknowledgments or clarifying questions.
Never use it to answer data-related questions like recommendations, gameplay details, tags, or relationships.
For data-related questions use "Graph Info" for explicit relationships, attributes, counts and filters, and "Game Search" for descriptive or thematic similarity.

To use a tool, use the following format:

Thought: Do I need to use a tool? Yes
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action

When you have a response for the Human, or if you do not need to use a tool, you MUST use the format:

Thought: Do I need to use a tool? No
Final Answer: [your response here]

Never give a Final Answer to a data question without using a tool first.
If a tool returns a list, format it as bullet points.
Always use the output of the tool in your response.
Never say "I don't know" unless the result is actually empty.

Begin!"#
    )
}

/// Renders prior turns, the new input and the steps taken so far
///
/// The scratchpad holds completed `Thought` / `Action` / `Observation`
/// blocks of the current cycle.
pub fn render_agent_input(history: &[Turn], input: &str, scratchpad: &str) -> String {
    let mut out = String::from("Previous conversation history:\n");
    if history.is_empty() {
        out.push_str("(none)\n");
    }
    for turn in history {
        let speaker = match turn.role {
            Role::User => "Human",
            Role::Assistant => "AI",
        };
        let _ = writeln!(out, "{}: {}", speaker, turn.content);
    }
    let _ = write!(out, "\nNew input: {}\n{}", input, scratchpad);
    out
}
