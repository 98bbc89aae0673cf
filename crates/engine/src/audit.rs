//! Audit recording for synthesized answers.
//!
//! Every answer that reached the model is written once to the configured
//! [`AuditSink`] and echoed to the log. A failing sink never fails the
//! request: the error is logged and the answer is still returned.

use chrono::Utc;
use salesrag_core::answer::TokenUsage;
use salesrag_core::audit::{AuditRecord, AuditSink};
use salesrag_core::retrieval::{AccessRole, Intent, SalesOrderRow, VectorHit};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything known about one answered question.
pub struct AnsweredQuestion<'a> {
    pub question: &'a str,
    pub intent: Intent,
    pub role: &'a AccessRole,
    pub rows: &'a [SalesOrderRow],
    pub hits: &'a [VectorHit],
    pub answer: &'a str,
    pub usage: TokenUsage,
    pub model_used: &'a str,
}

impl AnsweredQuestion<'_> {
    pub fn to_record(&self) -> AuditRecord {
        AuditRecord {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            question: self.question.to_string(),
            intent: self.intent,
            role: self.role.label().to_string(),
            structured_count: self.rows.len(),
            vector_count: self.hits.len(),
            top_score: self.hits.first().map(|h| h.score),
            answer: self.answer.to_string(),
            prompt_tokens: self.usage.prompt,
            completion_tokens: self.usage.completion,
            total_tokens: self.usage.total,
            model_used: self.model_used.to_string(),
        }
    }
}

pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Append the record. Never fails.
    pub async fn record(&self, answered: &AnsweredQuestion<'_>) {
        let record = answered.to_record();
        info!(
            id = %record.id,
            intent = %record.intent,
            role = %record.role,
            structured = record.structured_count,
            vectors = record.vector_count,
            top_score = ?record.top_score,
            model = %record.model_used,
            total_tokens = record.total_tokens,
            "AUDIT"
        );

        if let Err(e) = self.sink.append(&record).await {
            warn!(sink = self.sink.name(), error = %e, "Failed to write audit record");
        }
    }
}
