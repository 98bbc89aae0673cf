//! Shared test doubles for engine tests.

use async_trait::async_trait;
use salesrag_core::audit::{AuditRecord, AuditSink};
use salesrag_core::embedding::{Embedder, EmbeddingVector};
use salesrag_core::error::{ProviderError, StoreError};
use salesrag_core::message::Message;
use salesrag_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use salesrag_core::retrieval::VectorHit;
use salesrag_core::store::{DocumentChunk, VectorStore};
use salesrag_providers::FallbackProvider;
use std::sync::{Arc, Mutex};

/// A completion provider that fails for chosen models and records every request.
pub struct ScriptedProvider {
    answer: String,
    failing_models: Vec<String>,
    usage: Option<Usage>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.into(),
            failing_models: Vec::new(),
            usage: Some(Usage {
                prompt_tokens: 120,
                completion_tokens: 30,
                total_tokens: 150,
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for(mut self, models: &[&str]) -> Self {
        self.failing_models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn without_usage(mut self) -> Self {
        self.usage = None;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        if self.failing_models.contains(&model) {
            return Err(ProviderError::ApiError {
                status_code: 503,
                message: format!("{model} overloaded"),
            });
        }
        Ok(ProviderResponse {
            message: Message::assistant(self.answer.clone()),
            usage: self.usage,
            model,
        })
    }
}

/// Primary + fallback chain over a single scripted provider.
pub fn chain(provider: Arc<ScriptedProvider>) -> FallbackProvider {
    FallbackProvider::new("test")
        .add(provider.clone(), "primary-model")
        .add(provider, "fallback-model")
}

/// Returns the same vector for every text and counts calls.
pub struct StubEmbedder {
    vector: EmbeddingVector,
    calls: Mutex<usize>,
    fail: bool,
}

impl StubEmbedder {
    pub fn new(vector: EmbeddingVector) -> Self {
        Self {
            vector,
            calls: Mutex::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            vector: Vec::new(),
            calls: Mutex::new(0),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn name(&self) -> &str {
        "stub"
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }

    async fn embed(&self, _text: &str) -> Result<EmbeddingVector, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(ProviderError::Network("embedding service unreachable".into()));
        }
        Ok(self.vector.clone())
    }
}

/// A vector store that returns preset hits regardless of the query.
pub struct FixedVectorStore {
    hits: Vec<VectorHit>,
    calls: Mutex<usize>,
}

impl FixedVectorStore {
    pub fn new(hits: Vec<VectorHit>) -> Self {
        Self {
            hits,
            calls: Mutex::new(0),
        }
    }

    pub fn scored(scores: &[(&str, f32)]) -> Self {
        Self::new(scores.iter().map(|(c, s)| VectorHit::new(*c, *s)).collect())
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl VectorStore for FixedVectorStore {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn insert(&self, chunk: DocumentChunk) -> Result<String, StoreError> {
        Ok(chunk.id)
    }

    async fn nearest(
        &self,
        _query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorHit>, StoreError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.hits.len())
    }
}

/// Audit sink that records appends, or fails every append.
pub struct RecordingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    fail: bool,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Storage("audit table is read-only".into()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
