//! Reasoning agent for NextLevelBot
//!
//! The router runs the bounded Thought/Action/Observation loop, the parser
//! reads the model's step text, and the synthesizer turns backend results
//! into answers.

pub mod core;
pub mod react;
pub mod synthesizer;

pub use core::{
    classify_question, QuestionKind, ReasoningStep, Router, RouterOutcome, StepAction,
    Termination, ToolInvocation, MODEL_UNAVAILABLE_MESSAGE, UNABLE_MESSAGE,
};
pub use react::{parse_step, ParseError, StepDecision};
pub use synthesizer::{AnswerSynthesizer, NOT_FOUND_MESSAGE, NO_RESULTS_MESSAGE};
