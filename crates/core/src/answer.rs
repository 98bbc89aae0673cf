//! Answer types: the terminal output of one question.

use crate::provider::Usage;
use crate::retrieval::Intent;
use serde::{Deserialize, Serialize};

/// Fixed user-facing outcomes. These strings are part of the public contract.
pub mod outcomes {
    pub const EMPTY_QUESTION: &str = "Please provide a question.";
    pub const NOT_IN_KNOWLEDGE_BASE: &str = "Information not found in knowledge base.";
    pub const ORDER_NOT_FOUND: &str = "Sales order not found in system.";
    pub const NOTHING_RELEVANT: &str = "Relevant information not found.";
    pub const CONTEXT_TOO_LARGE: &str = "Request too large. Please narrow your query.";
    pub const SERVICE_UNAVAILABLE: &str =
        "AI service temporarily unavailable. Please try again later.";
    /// The refusal the model is instructed to emit when the context lacks the answer.
    pub const MODEL_REFUSAL: &str = "Information not found in system.";
}

/// Prompt/completion/total token counters for one synthesized answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

impl From<Option<Usage>> for TokenUsage {
    fn from(usage: Option<Usage>) -> Self {
        let usage = usage.unwrap_or_default();
        Self {
            prompt: usage.prompt_tokens,
            completion: usage.completion_tokens,
            total: usage.total_tokens,
        }
    }
}

/// The answer to one question, whether synthesized or produced by a guardrail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub intent: Intent,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl AnswerResult {
    /// A fixed outcome with no model involvement.
    pub fn fixed(intent: Intent, answer: &str) -> Self {
        Self {
            intent,
            answer: answer.to_string(),
            model_used: None,
            token_usage: None,
        }
    }
}

/// What the `ask` operation hands back to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AskResponse {
    /// Input was rejected before any processing.
    Rejected { error: String },
    /// An answer (synthesized or guardrail outcome).
    Answered(AnswerResult),
}

impl AskResponse {
    pub fn empty_question() -> Self {
        AskResponse::Rejected {
            error: outcomes::EMPTY_QUESTION.to_string(),
        }
    }

    /// The answer text, if this is not a rejection.
    pub fn answer(&self) -> Option<&str> {
        match self {
            AskResponse::Answered(result) => Some(&result.answer),
            AskResponse::Rejected { .. } => None,
        }
    }
}
