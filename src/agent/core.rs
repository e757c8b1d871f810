//! Tool router with a bounded reasoning loop
//!
//! Each step the model either picks exactly one tool or gives a final
//! answer. The loop:
//! - Re-routes data questions away from General Chat on the first action
//! - Rejects final answers to data questions given before any tool ran
//! - Feeds malformed steps back to the model as error observations
//! - Enforces the step and wall-clock budgets

use crate::agent::react::{parse_step, StepDecision};
use crate::agent::synthesizer::{claims_not_found, NOT_FOUND_MESSAGE};
use crate::config::AgentConfig;
use crate::error::{NextLevelError, Result};
use crate::prompts::agent_prompt::{render_agent_input, OBSERVATION_STOP};
use crate::prompts::PromptSet;
use crate::providers::{Message, Provider};
use crate::storage::Turn;
use crate::tools::{Observation, ToolKind, ToolRegistry};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Reply when a cycle ends without anything usable
pub const UNABLE_MESSAGE: &str =
    "I was unable to complete that request. Please try rephrasing your question.";

/// Reply when the language model cannot be reached
pub const MODEL_UNAVAILABLE_MESSAGE: &str =
    "The language model is unavailable right now, please try again.";

const EARLY_ANSWER_OBSERVATION: &str = "Error: a data question must be answered from a tool observation. Use Graph Info or Game Search before giving a Final Answer.";

/// How a reasoning cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The model gave an accepted final answer
    FinalAnswerProduced,
    /// `max_steps` ran out
    StepBudgetExhausted,
    /// `timeout_seconds` ran out
    TimeBudgetExhausted,
    /// The model could not be reached
    UnrecoverableError,
}

impl Termination {
    /// Snake-case name used in logs and JSON output
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::FinalAnswerProduced => "final_answer_produced",
            Termination::StepBudgetExhausted => "step_budget_exhausted",
            Termination::TimeBudgetExhausted => "time_budget_exhausted",
            Termination::UnrecoverableError => "unrecoverable_error",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tool call and what it returned
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub kind: ToolKind,
    pub input: String,
    pub observation: Observation,
}

/// The decision taken in a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// A tool was invoked
    Tool(ToolKind),
    /// The model answered and the answer was accepted
    FinalAnswer,
    /// The model output was malformed or its answer was refused
    Rejected,
}

/// Record of one reasoning step
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningStep {
    pub thought: String,
    pub action: StepAction,
    pub invocation: Option<ToolInvocation>,
    /// Text fed back to the model; empty for an accepted final answer
    pub observation: String,
}

/// Result of a reasoning cycle
#[derive(Debug, Clone)]
pub struct RouterOutcome {
    /// Never empty
    pub answer: String,
    pub termination: Termination,
    pub steps: Vec<ReasoningStep>,
}

impl RouterOutcome {
    /// Number of tools actually invoked
    pub fn tool_calls(&self) -> usize {
        self.steps.iter().filter(|s| s.invocation.is_some()).count()
    }
}

/// Coarse intent of a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Greetings, thanks, questions about the bot itself
    Conversational,
    /// Relationships, attributes, counts, filters
    Structured,
    /// Thematic similarity and descriptions
    Descriptive,
}

impl QuestionKind {
    /// Whether answering needs the knowledge graph
    pub fn is_data(self) -> bool {
        !matches!(self, QuestionKind::Conversational)
    }

    /// Tool to use when the model picks General Chat for a data question
    pub fn preferred_tool(self) -> Option<ToolKind> {
        match self {
            QuestionKind::Conversational => None,
            QuestionKind::Structured => Some(ToolKind::GraphInfo),
            QuestionKind::Descriptive => Some(ToolKind::GameSearch),
        }
    }
}

const DESCRIPTIVE_CUES: &[&str] = &[
    "games like",
    "game like",
    "similar to",
    "similar games",
    "described as",
    "description",
    "recommend",
    "recommendation",
    "recommendations",
    "suggest",
    "suggestion",
    "suggestions",
    "cozy",
    "relaxing",
    "atmosphere",
    "atmospheric",
    "vibe",
    "theme",
    "themed",
    "story",
    "tell me about",
];

const STRUCTURED_CUES: &[&str] = &[
    "how many",
    "who played",
    "who plays",
    "who wrote",
    "who reviewed",
    "who owns",
    "which",
    "play",
    "played",
    "plays",
    "own",
    "owns",
    "playtime",
    "player",
    "players",
    "user",
    "users",
    "friend",
    "friends",
    "tag",
    "tags",
    "tagged",
    "platform",
    "platforms",
    "supports",
    "review",
    "reviews",
    "reviewed",
    "count",
    "price",
    "released",
    "release",
    "app id",
    "list",
    "most",
    "top",
];

const DATA_NOUNS: &[&str] = &["game", "games", "genre", "genres", "steam", "title", "titles"];

fn mentions(lower: &str, words: &[&str], cues: &[&str]) -> bool {
    cues.iter().any(|cue| {
        if cue.contains(' ') {
            lower.contains(cue)
        } else {
            words.contains(cue)
        }
    })
}

/// Classifies a user message by the tool that should answer it
///
/// # Examples
///
/// ```
/// use nextlevelbot::agent::{classify_question, QuestionKind};
///
/// assert_eq!(classify_question("Who played Stardew Valley?"), QuestionKind::Structured);
/// assert_eq!(classify_question("Recommend cozy farming games"), QuestionKind::Descriptive);
/// assert_eq!(classify_question("thanks!"), QuestionKind::Conversational);
/// ```
pub fn classify_question(text: &str) -> QuestionKind {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if mentions(&lower, &words, DESCRIPTIVE_CUES) {
        QuestionKind::Descriptive
    } else if mentions(&lower, &words, STRUCTURED_CUES) {
        QuestionKind::Structured
    } else if mentions(&lower, &words, DATA_NOUNS) {
        QuestionKind::Descriptive
    } else {
        QuestionKind::Conversational
    }
}

/// Drives the reasoning loop over the registered tools
pub struct Router {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    prompts: Arc<PromptSet>,
    config: AgentConfig,
}

impl Router {
    /// Creates a router
    ///
    /// # Errors
    ///
    /// Returns `NextLevelError::Config` if `max_steps` is zero or a tool
    /// kind is missing from the registry
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        prompts: Arc<PromptSet>,
        config: AgentConfig,
    ) -> Result<Self> {
        if config.max_steps == 0 {
            return Err(
                NextLevelError::Config("max_steps must be greater than 0".to_string()).into(),
            );
        }
        if !tools.is_complete() {
            return Err(NextLevelError::Config(format!(
                "Tool registry must contain {}; found {}",
                ToolKind::ALL.map(|k| k.name()).join(", "),
                tools
                    .kinds()
                    .iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .into());
        }

        Ok(Self {
            provider,
            tools,
            prompts,
            config,
        })
    }

    /// Answers `input` given the prior transcript
    ///
    /// Never fails: every problem ends up in the outcome's termination
    /// state and a readable answer.
    pub async fn run(&self, history: &[Turn], input: &str) -> RouterOutcome {
        let started = Instant::now();
        let budget = Duration::from_secs(self.config.timeout_seconds);
        let kind = classify_question(input);
        let stop = vec![OBSERVATION_STOP.to_string()];

        info!(
            "Starting reasoning cycle ({:?} question, {} prior turns)",
            kind,
            history.len()
        );

        let mut steps: Vec<ReasoningStep> = Vec::new();
        let mut scratchpad = String::new();

        loop {
            if steps.len() >= self.config.max_steps {
                warn!("Step budget of {} exhausted", self.config.max_steps);
                return self.exhausted(Termination::StepBudgetExhausted, steps, kind);
            }
            let Some(remaining) = budget.checked_sub(started.elapsed()) else {
                warn!("Time budget of {}s exhausted", self.config.timeout_seconds);
                return self.exhausted(Termination::TimeBudgetExhausted, steps, kind);
            };

            debug!("Step {}/{}", steps.len() + 1, self.config.max_steps);

            let messages = [
                Message::system(self.prompts.agent()),
                Message::user(render_agent_input(history, input, &scratchpad)),
            ];
            let reply =
                match tokio::time::timeout(remaining, self.provider.complete(&messages, &stop)).await
                {
                    Err(_) => {
                        warn!("Time budget exhausted waiting for the model");
                        return self.exhausted(Termination::TimeBudgetExhausted, steps, kind);
                    }
                    Ok(Err(e)) => {
                        warn!("Model call failed: {}", e);
                        return RouterOutcome {
                            answer: MODEL_UNAVAILABLE_MESSAGE.to_string(),
                            termination: Termination::UnrecoverableError,
                            steps,
                        };
                    }
                    Ok(Ok(response)) => response.content,
                };

            let decision = match parse_step(&reply) {
                Ok(decision) => decision,
                Err(e) => {
                    debug!("Malformed step: {}", e);
                    let observation = format!("Invalid Format: {}", e);
                    push_scratchpad(&mut scratchpad, reply.trim(), &observation);
                    steps.push(ReasoningStep {
                        thought: String::new(),
                        action: StepAction::Rejected,
                        invocation: None,
                        observation,
                    });
                    continue;
                }
            };

            match decision {
                StepDecision::FinalAnswer { thought, answer } => {
                    if kind.is_data() && !steps.iter().any(|s| s.invocation.is_some()) {
                        debug!("Refusing final answer given before any tool");
                        push_scratchpad(&mut scratchpad, reply.trim(), EARLY_ANSWER_OBSERVATION);
                        steps.push(ReasoningStep {
                            thought,
                            action: StepAction::Rejected,
                            invocation: None,
                            observation: EARLY_ANSWER_OBSERVATION.to_string(),
                        });
                        continue;
                    }

                    steps.push(ReasoningStep {
                        thought,
                        action: StepAction::FinalAnswer,
                        invocation: None,
                        observation: String::new(),
                    });
                    let answer = finalize_answer(&answer, &steps, kind);
                    info!(
                        "Reasoning cycle finished in {} steps, {:?}",
                        steps.len(),
                        started.elapsed()
                    );
                    return RouterOutcome {
                        answer,
                        termination: Termination::FinalAnswerProduced,
                        steps,
                    };
                }
                StepDecision::Action {
                    thought,
                    tool,
                    input: tool_input,
                } => {
                    let first_action = !steps.iter().any(|s| s.invocation.is_some());
                    let (tool, tool_input) = match kind.preferred_tool() {
                        Some(preferred) if first_action && tool == ToolKind::GeneralChat => {
                            info!("Re-routing data question from {} to {}", tool, preferred);
                            (preferred, input.to_string())
                        }
                        _ => (tool, tool_input),
                    };

                    let remaining = budget.saturating_sub(started.elapsed());
                    let observation = match self.invoke(tool, &tool_input, remaining).await {
                        Some(observation) => observation,
                        None => {
                            warn!("Time budget exhausted during {}", tool);
                            return self.exhausted(Termination::TimeBudgetExhausted, steps, kind);
                        }
                    };

                    let message = observation.to_message();
                    debug!("{} observation: {} bytes", tool, message.len());
                    let block = format!(
                        "Thought: {}\nAction: {}\nAction Input: {}",
                        thought, tool, tool_input
                    );
                    push_scratchpad(&mut scratchpad, &block, &message);
                    steps.push(ReasoningStep {
                        thought,
                        action: StepAction::Tool(tool),
                        invocation: Some(ToolInvocation {
                            kind: tool,
                            input: tool_input,
                            observation,
                        }),
                        observation: message,
                    });
                }
            }
        }
    }

    /// Runs one tool; `None` means the time budget ran out
    async fn invoke(&self, kind: ToolKind, input: &str, remaining: Duration) -> Option<Observation> {
        let Some(executor) = self.tools.get(kind) else {
            return Some(Observation::failed(format!("{} is not available", kind)));
        };

        debug!("Executing tool: {}", kind);
        match tokio::time::timeout(remaining, executor.execute(input)).await {
            Err(_) => None,
            Ok(Err(e)) => {
                warn!("Tool {} failed: {}", kind, e);
                Some(Observation::failed(e.to_string()))
            }
            Ok(Ok(observation)) => {
                Some(observation.truncate_if_needed(self.config.max_observation_size))
            }
        }
    }

    fn exhausted(
        &self,
        termination: Termination,
        steps: Vec<ReasoningStep>,
        kind: QuestionKind,
    ) -> RouterOutcome {
        let answer = best_partial_answer(&steps, kind);
        info!("Reasoning cycle ended: {}", termination);
        RouterOutcome {
            answer,
            termination,
            steps,
        }
    }
}

fn push_scratchpad(scratchpad: &mut String, step: &str, observation: &str) {
    scratchpad.push_str(step);
    scratchpad.push_str("\nObservation: ");
    scratchpad.push_str(observation);
    scratchpad.push('\n');
}

fn invocations(steps: &[ReasoningStep]) -> impl Iterator<Item = &ToolInvocation> {
    steps.iter().filter_map(|s| s.invocation.as_ref())
}

/// Last non-blank content observation
///
/// For data questions only the data tools count as evidence.
fn last_content(steps: &[ReasoningStep], kind: QuestionKind) -> Option<String> {
    invocations(steps)
        .filter(|i| !kind.is_data() || i.kind.is_data_tool())
        .filter_map(|i| match &i.observation {
            Observation::Content { text, .. } if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        })
        .last()
}

/// Answer for a cycle that has no usable content
fn no_content_answer(steps: &[ReasoningStep]) -> String {
    if invocations(steps).any(|i| matches!(i.observation, Observation::Empty(_))) {
        NOT_FOUND_MESSAGE.to_string()
    } else {
        UNABLE_MESSAGE.to_string()
    }
}

/// Checks the model's final answer against what the tools returned
///
/// A data question is only answered from data tool content: when every
/// lookup came back empty or failed, the answer is the not-found or unable
/// message, whatever the model wrote. A blank answer, or a "not found"
/// claim over real data, is replaced by the last observation with content.
fn finalize_answer(answer: &str, steps: &[ReasoningStep], kind: QuestionKind) -> String {
    let used: Vec<&ToolInvocation> = invocations(steps).collect();
    if !used.is_empty() && used.iter().all(|i| matches!(i.observation, Observation::Empty(_))) {
        return NOT_FOUND_MESSAGE.to_string();
    }

    let content = last_content(steps, kind);
    if kind.is_data() && content.is_none() {
        warn!("No tool produced data; discarding the model's final answer");
        return no_content_answer(steps);
    }

    let answer = answer.trim();
    if answer.is_empty() || claims_not_found(answer) {
        if let Some(content) = content {
            return content;
        }
    }
    if answer.is_empty() {
        return if used.is_empty() {
            UNABLE_MESSAGE.to_string()
        } else {
            NOT_FOUND_MESSAGE.to_string()
        };
    }
    answer.to_string()
}

fn best_partial_answer(steps: &[ReasoningStep], kind: QuestionKind) -> String {
    last_content(steps, kind).unwrap_or_else(|| no_content_answer(steps))
}
