//! Answer synthesis: one completion call over the composed context.
//!
//! The primary model is tried first and the fallback model second (see
//! [`FallbackProvider`]). If both fail the result is
//! [`Synthesis::Unavailable`], a normal outcome rather than an error.

use salesrag_core::answer::{TokenUsage, outcomes};
use salesrag_core::message::Message;
use salesrag_core::provider::{Provider, ProviderRequest};
use salesrag_providers::FallbackProvider;
use tracing::{info, warn};

/// Sampling temperature for answers.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Instructions that keep the model inside the supplied context.
pub fn system_prompt() -> String {
    format!(
        "You are an enterprise SAP sales assistant.\n\
         Answer strictly from the context provided in the user message.\n\
         Do not use external or general knowledge.\n\
         Do not infer, assume or invent policies, thresholds, rules or values that are not stated in the context.\n\
         Quote order numbers, amounts and currencies exactly as they appear.\n\
         If the context does not contain the information needed, reply exactly: \"{}\"",
        outcomes::MODEL_REFUSAL
    )
}

/// The user turn: context and question, verbatim.
pub fn user_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion:\n{question}")
}

/// Outcome of one synthesis attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesis {
    Answered {
        answer: String,
        model_used: String,
        usage: TokenUsage,
    },
    Unavailable,
}

pub struct AnswerSynthesizer {
    chain: FallbackProvider,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl AnswerSynthesizer {
    /// `chain` must list the primary model first and the fallback second.
    pub fn new(chain: FallbackProvider) -> Self {
        Self {
            chain,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub async fn synthesize(&self, context: &str, question: &str) -> Synthesis {
        let request = ProviderRequest {
            // Each chain entry substitutes its own model.
            model: String::new(),
            messages: vec![
                Message::system(system_prompt()),
                Message::user(user_prompt(context, question)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.chain.complete(request).await {
            Ok(response) => {
                let usage = TokenUsage::from(response.usage);
                info!(
                    model = %response.model,
                    prompt_tokens = usage.prompt,
                    completion_tokens = usage.completion,
                    "Answer synthesized"
                );
                Synthesis::Answered {
                    answer: response.message.content,
                    model_used: response.model,
                    usage,
                }
            }
            Err(e) => {
                warn!(
                    models = ?self.chain.models(),
                    error = %e,
                    "All completion models failed"
                );
                Synthesis::Unavailable
            }
        }
    }
}
