//! Answer synthesis from backend results
//!
//! Backend records are turned into prose by the model, but the data always
//! wins on the structured path: lists are rendered as bullet lines, and when
//! the model claims that non-empty records were "not found" the deterministic
//! rendering of the records is returned instead.
//!
//! The semantic path is different. A vector index always returns its nearest
//! neighbours, relevant or not, so there the model's inability statement is
//! the only signal that the context does not answer the question.

use crate::error::Result;
use crate::graph::{Record, SearchHit};
use crate::prompts::PromptSet;
use crate::providers::{Message, Provider};

use serde_json::Value;
use std::sync::Arc;

/// Message used whenever a lookup produced nothing
pub const NOT_FOUND_MESSAGE: &str = "I could not find that information in the database.";

/// Message used when the query ran but matched nothing
pub const NO_RESULTS_MESSAGE: &str = "The query was executed but returned no results.";

const NOT_FOUND_PHRASES: &[&str] = &[
    "not found",
    "could not find",
    "couldn't find",
    "cannot find",
    "can't find",
    "unable to find",
    "no results",
    "no data",
    "no information",
    "does not exist",
    "doesn't exist",
    "don't know",
    "do not know",
];

/// Turns records and search hits into user-facing answers
pub struct AnswerSynthesizer {
    provider: Arc<dyn Provider>,
    prompts: Arc<PromptSet>,
}

impl AnswerSynthesizer {
    /// Creates a synthesizer over a provider and the prompt set
    pub fn new(provider: Arc<dyn Provider>, prompts: Arc<PromptSet>) -> Self {
        Self { provider, prompts }
    }

    /// Answers `question` from structured query records
    ///
    /// Empty records yield [`NO_RESULTS_MESSAGE`] without a model call.
    ///
    /// # Errors
    ///
    /// Never fails on model errors; those fall back to the deterministic
    /// rendering. The `Result` is kept for symmetry with the other tools.
    pub async fn structured(&self, question: &str, records: &[Record]) -> Result<String> {
        if records.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }

        let rendered = render_records(records);
        let prompt = self.prompts.structured_answer(&rendered, question);

        let answer = match self.provider.complete(&[Message::user(prompt)], &[]).await {
            Ok(response) => response.content,
            Err(e) => {
                tracing::warn!("Answer synthesis failed, using record rendering: {}", e);
                return Ok(rendered);
            }
        };

        Ok(guard_answer(&answer, &rendered))
    }

    /// Answers `question` from semantic search hits
    ///
    /// Returns `None` when there are no hits, or when the model finds the
    /// retrieved descriptions do not answer the question.
    ///
    /// # Errors
    ///
    /// Returns error if the model call fails
    pub async fn semantic(&self, question: &str, hits: &[SearchHit]) -> Result<Option<String>> {
        if hits.is_empty() {
            return Ok(None);
        }

        let context = hits
            .iter()
            .map(SearchHit::to_context)
            .collect::<Vec<_>>()
            .join("\n\n");
        let messages = [
            Message::system(self.prompts.semantic_answer(&context)),
            Message::user(question),
        ];

        let answer = unwrap_json_answer(&self.provider.complete(&messages, &[]).await?.content);
        if answer.is_empty() || claims_not_found(&answer) {
            tracing::debug!("Retrieved descriptions do not answer the question");
            return Ok(None);
        }
        Ok(Some(answer))
    }
}

/// Picks the answer text, replacing empty or "not found" answers
///
/// A model answer that is itself a JSON object goes through
/// [`fallback_text`] first.
pub fn guard_answer(answer: &str, rendered: &str) -> String {
    let answer = unwrap_json_answer(answer);

    if answer.is_empty() {
        return rendered.to_string();
    }

    if claims_not_found(&answer) {
        tracing::warn!("Model reported no data for non-empty results; using record rendering");
        return rendered.to_string();
    }

    answer
}

fn unwrap_json_answer(answer: &str) -> String {
    match serde_json::from_str::<Value>(answer.trim()) {
        Ok(Value::Object(map)) => fallback_text(&map).unwrap_or_default(),
        _ => answer.trim().to_string(),
    }
}

/// Whether `text` says the information was not found
pub fn claims_not_found(text: &str) -> bool {
    let lower = text.to_lowercase();
    NOT_FOUND_PHRASES.iter().any(|p| lower.contains(p))
}

/// Selects the text of an ambiguous result object
///
/// Field order: `result`, then `answer`, then the first non-empty field in
/// key order.
pub fn fallback_text(record: &Record) -> Option<String> {
    for key in ["result", "answer"] {
        if let Some(value) = record.get(key).filter(|v| !is_blank(v)) {
            return Some(value_to_text(value));
        }
    }

    record
        .values()
        .find(|v| !is_blank(v))
        .map(|v| format!("Query executed successfully. Result: {}", value_to_text(v)))
}

/// Renders records as bullet lines, one record per line
///
/// # Examples
///
/// ```
/// use nextlevelbot::agent::synthesizer::render_records;
/// use serde_json::json;
///
/// let rows = vec![
///     json!({"u.username": "alice", "p.total_playtime": 120}),
///     json!({"u.username": "bob", "p.total_playtime": 45}),
/// ];
/// let records: Vec<_> = rows.into_iter().filter_map(|r| r.as_object().cloned()).collect();
/// assert_eq!(
///     render_records(&records),
///     "- u.username: alice, p.total_playtime: 120\n- u.username: bob, p.total_playtime: 45"
/// );
/// ```
pub fn render_records(records: &[Record]) -> String {
    records
        .iter()
        .map(|record| {
            if record.len() == 1 {
                let value = record.values().next().map(value_to_text).unwrap_or_default();
                format!("- {}", value)
            } else {
                let fields = record
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, value_to_text(v)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("- {}", fields)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_to_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
