//! The hybrid engine: one independent pass per question.
//!
//! ```text
//! question ─▶ classify ─▶ retrieve (structured ∥ vector) ─▶ guard
//!          ─▶ compose ─▶ budget ─▶ synthesize ─▶ audit ─▶ answer
//! ```
//!
//! Every guard is an early exit that yields a fixed answer. Only genuine
//! faults (embedding or store failures) come back as `Err`.

use crate::audit::{AnsweredQuestion, AuditRecorder};
use crate::context::ContextComposer;
use crate::intent::{IntentClassifier, KeywordIntentClassifier};
use crate::order_numbers::contains_order_number;
use crate::structured_retriever::{DEFAULT_HIGH_VALUE_THRESHOLD, StructuredRetriever};
use crate::synthesizer::{AnswerSynthesizer, DEFAULT_TEMPERATURE, Synthesis};
use crate::vector_retriever::{VectorRetriever, VectorSearchSettings};
use salesrag_config::AppConfig;
use salesrag_core::answer::{AnswerResult, AskResponse, outcomes};
use salesrag_core::audit::AuditSink;
use salesrag_core::embedding::Embedder;
use salesrag_core::error::Result;
use salesrag_core::retrieval::{AccessRole, Intent, SalesOrderRow, VectorHit};
use salesrag_core::store::{OrderStore, VectorStore};
use salesrag_providers::FallbackProvider;
use std::sync::Arc;
use tracing::{debug, info};

/// Tunables for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub vector: VectorSearchSettings,
    pub high_value_threshold: f64,
    pub max_context_tokens: usize,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            vector: VectorSearchSettings::default(),
            high_value_threshold: DEFAULT_HIGH_VALUE_THRESHOLD,
            max_context_tokens: crate::context::DEFAULT_MAX_CONTEXT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            vector: VectorSearchSettings {
                top_k: config.retrieval.top_k,
                relative_threshold: config.retrieval.relative_threshold,
                gap_margin: config.retrieval.gap_margin,
            },
            high_value_threshold: config.retrieval.high_value_threshold,
            max_context_tokens: config.guard.max_context_tokens,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        }
    }
}

pub struct HybridEngine {
    classifier: Box<dyn IntentClassifier>,
    vector: VectorRetriever,
    structured: StructuredRetriever,
    composer: ContextComposer,
    synthesizer: AnswerSynthesizer,
    audit: AuditRecorder,
}

impl HybridEngine {
    /// Build an engine with default settings and the keyword classifier.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        order_store: Arc<dyn OrderStore>,
        completion: FallbackProvider,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self::with_settings(
            embedder,
            vector_store,
            order_store,
            completion,
            audit_sink,
            EngineSettings::default(),
        )
    }

    pub fn with_settings(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        order_store: Arc<dyn OrderStore>,
        completion: FallbackProvider,
        audit_sink: Arc<dyn AuditSink>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            classifier: Box::new(KeywordIntentClassifier::default()),
            vector: VectorRetriever::new(embedder, vector_store).with_settings(settings.vector),
            structured: StructuredRetriever::new(order_store)
                .with_high_value_threshold(settings.high_value_threshold),
            composer: ContextComposer::new(settings.max_context_tokens),
            synthesizer: AnswerSynthesizer::new(completion)
                .with_temperature(settings.temperature)
                .with_max_tokens(settings.max_tokens),
            audit: AuditRecorder::new(audit_sink),
        }
    }

    /// Swap the intent classifier.
    pub fn with_classifier(mut self, classifier: impl IntentClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Answer one question on behalf of `role`.
    pub async fn ask(&self, question: &str, role: &AccessRole) -> Result<AskResponse> {
        if question.trim().is_empty() {
            debug!(role = %role, "Rejected empty question");
            return Ok(AskResponse::empty_question());
        }

        let intent = self.classifier.classify(question);
        let (rows, hits) = self.retrieve(intent, question, role).await?;

        info!(
            intent = %intent,
            role = %role,
            structured = rows.len(),
            vectors = hits.len(),
            top_score = ?hits.first().map(|h| h.score),
            "Retrieval complete"
        );

        if let Some(outcome) = guard_retrieval(intent, question, &rows, &hits) {
            debug!(intent = %intent, outcome, "Retrieval guard tripped");
            return Ok(fixed(intent, outcome));
        }

        let context = self.composer.compose(&rows, &hits)?;
        if self.composer.exceeds_budget(&context) {
            info!(
                intent = %intent,
                chars = context.chars().count(),
                budget = self.composer.max_context_tokens(),
                "Context over token budget"
            );
            return Ok(fixed(intent, outcomes::CONTEXT_TOO_LARGE));
        }

        match self.synthesizer.synthesize(&context, question).await {
            Synthesis::Unavailable => Ok(fixed(intent, outcomes::SERVICE_UNAVAILABLE)),
            Synthesis::Answered {
                answer,
                model_used,
                usage,
            } => {
                self.audit
                    .record(&AnsweredQuestion {
                        question,
                        intent,
                        role,
                        rows: &rows,
                        hits: &hits,
                        answer: &answer,
                        usage,
                        model_used: &model_used,
                    })
                    .await;

                Ok(AskResponse::Answered(AnswerResult {
                    intent,
                    answer,
                    model_used: Some(model_used),
                    token_usage: Some(usage),
                }))
            }
        }
    }

    async fn retrieve(
        &self,
        intent: Intent,
        question: &str,
        role: &AccessRole,
    ) -> Result<(Vec<SalesOrderRow>, Vec<VectorHit>)> {
        // Skipped paths resolve immediately; hybrid runs both concurrently.
        let structured = async {
            if intent.uses_structured() {
                self.structured.search(question, role).await
            } else {
                Ok(Vec::new())
            }
        };
        let vector = async {
            if intent.uses_vector() {
                self.vector.search(question).await
            } else {
                Ok(Vec::new())
            }
        };
        tokio::try_join!(structured, vector)
    }
}

/// The fixed outcome, if retrieval results rule out synthesis.
///
/// A referenced order that cannot be resolved wins over everything else.
fn guard_retrieval(
    intent: Intent,
    question: &str,
    rows: &[SalesOrderRow],
    hits: &[VectorHit],
) -> Option<&'static str> {
    if rows.is_empty() && contains_order_number(question) {
        return Some(outcomes::ORDER_NOT_FOUND);
    }
    match intent {
        Intent::Vector if hits.is_empty() => Some(outcomes::NOT_IN_KNOWLEDGE_BASE),
        Intent::Structured if rows.is_empty() => Some(outcomes::ORDER_NOT_FOUND),
        Intent::Hybrid if rows.is_empty() && hits.is_empty() => Some(outcomes::NOTHING_RELEVANT),
        _ => None,
    }
}

fn fixed(intent: Intent, outcome: &str) -> AskResponse {
    AskResponse::Answered(AnswerResult::fixed(intent, outcome))
}
