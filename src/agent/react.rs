//! Reasoning-step parsing
//!
//! The model answers in the text protocol
//!
//! ```text
//! Thought: Do I need to use a tool? Yes
//! Action: Graph Info
//! Action Input: Who played Stardew Valley?
//! ```
//!
//! or finishes with `Final Answer: ...`. [`parse_step`] is the only place
//! that reads this format.

use crate::error::NextLevelError;
use crate::tools::ToolKind;

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// What the model decided in one step
#[derive(Debug, Clone, PartialEq)]
pub enum StepDecision {
    /// Invoke a tool
    Action {
        /// Reasoning text preceding the action
        thought: String,
        /// Tool to invoke
        tool: ToolKind,
        /// Text passed to the tool
        input: String,
    },
    /// Reply to the user
    FinalAnswer {
        /// Reasoning text preceding the answer
        thought: String,
        /// Answer text
        answer: String,
    },
}

/// Ways a step can fail to parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing but whitespace
    #[error("Model output was empty")]
    Empty,

    /// Neither `Action:` nor `Final Answer:` was present
    #[error("Missing 'Action:' after 'Thought:'")]
    MissingAction,

    /// `Action:` without a usable `Action Input:`
    #[error("Missing 'Action Input:' after 'Action: {0}'")]
    MissingActionInput(String),

    /// `Action:` named something outside the registry
    #[error("{0} is not a valid tool, try one of [General Chat, Game Search, Graph Info]")]
    UnknownTool(String),

    /// Output carried an action and a final answer at once
    #[error("Output contains both an action and a final answer")]
    BothActionAndFinalAnswer,
}

impl From<ParseError> for NextLevelError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnknownTool(name) => NextLevelError::UnknownTool(name),
            other => NextLevelError::MalformedReasoning(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Thought,
    Action,
    ActionInput,
    FinalAnswer,
    Observation,
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*\**\s*(thought|action[ _]input|action|final[ _]answer|observation)\s*\**\s*:\s*\**\s*(.*)$",
        )
        .expect("Invalid marker pattern")
    })
}

fn section_of(marker: &str) -> Section {
    let marker = marker.to_ascii_lowercase().replace('_', " ");
    match marker.as_str() {
        "thought" => Section::Thought,
        "action" => Section::Action,
        "action input" => Section::ActionInput,
        "final answer" => Section::FinalAnswer,
        _ => Section::Observation,
    }
}

/// Splits the output into marked sections
///
/// Unmarked leading text counts as thought. Parsing stops at the first
/// `Observation:` since observations come from tools, never the model.
fn split_sections(text: &str) -> Vec<(Section, String)> {
    let mut sections: Vec<(Section, String)> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = marker_regex().captures(line) {
            let section = section_of(&caps[1]);
            if section == Section::Observation {
                break;
            }
            sections.push((section, caps[2].to_string()));
            continue;
        }
        match sections.last_mut() {
            Some((_, body)) => {
                body.push('\n');
                body.push_str(line);
            }
            None => sections.push((Section::Thought, line.to_string())),
        }
    }
    sections
}

fn first(sections: &[(Section, String)], wanted: Section) -> Option<String> {
    sections
        .iter()
        .find(|(section, _)| *section == wanted)
        .map(|(_, body)| body.trim().to_string())
}

fn clean_input(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

/// Parses one model reply into a [`StepDecision`]
///
/// # Errors
///
/// Returns a [`ParseError`] naming exactly what was wrong; the router feeds
/// it back to the model as an observation.
///
/// # Examples
///
/// ```
/// use nextlevelbot::agent::react::{parse_step, StepDecision};
/// use nextlevelbot::tools::ToolKind;
///
/// let step = parse_step("Thought: Do I need to use a tool? Yes\nAction: Graph Info\nAction Input: Who played Hades?").unwrap();
/// assert!(matches!(step, StepDecision::Action { tool: ToolKind::GraphInfo, .. }));
/// ```
pub fn parse_step(text: &str) -> Result<StepDecision, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let sections = split_sections(text);
    let thought = first(&sections, Section::Thought).unwrap_or_default();
    let action = first(&sections, Section::Action);
    let final_answer = first(&sections, Section::FinalAnswer);

    match (action, final_answer) {
        (Some(_), Some(_)) => Err(ParseError::BothActionAndFinalAnswer),
        (None, Some(answer)) => Ok(StepDecision::FinalAnswer { thought, answer }),
        (None, None) => Err(ParseError::MissingAction),
        (Some(action), None) => {
            let tool: ToolKind = action.parse().map_err(|e| match e {
                NextLevelError::UnknownTool(name) => ParseError::UnknownTool(name),
                _ => ParseError::UnknownTool(action.clone()),
            })?;
            let input = first(&sections, Section::ActionInput)
                .map(|raw| clean_input(&raw))
                .filter(|input| !input.is_empty())
                .ok_or_else(|| ParseError::MissingActionInput(tool.name().to_string()))?;
            Ok(StepDecision::Action {
                thought,
                tool,
                input,
            })
        }
    }
}
