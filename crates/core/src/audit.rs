//! Audit records: one durable row per synthesized answer.

use crate::error::StoreError;
use crate::retrieval::Intent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single audit log entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub question: String,
    pub intent: Intent,
    /// Role label of the requester.
    pub role: String,
    pub structured_count: usize,
    pub vector_count: usize,
    /// Best vector score, if any vector hit survived retrieval.
    pub top_score: Option<f32>,
    pub answer: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub model_used: String,
}

/// Append-only destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// The sink name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Append one record.
    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError>;
}
