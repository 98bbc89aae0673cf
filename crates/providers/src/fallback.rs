//! Model fallback: ordered retry chain of (provider, model) pairs.
//!
//! When a completion call fails for any reason, the next entry in the chain
//! is tried with the same messages. The first success wins. The returned
//! [`ProviderResponse::model`] is the configured identifier of the entry that
//! answered, so callers can record which model actually produced the text.

use async_trait::async_trait;
use salesrag_core::error::ProviderError;
use salesrag_core::provider::*;
use std::sync::Arc;
use tracing::{info, warn};

/// A provider that wraps an ordered list of model entries and falls back on failure.
pub struct FallbackProvider {
    name: String,
    chain: Vec<FallbackEntry>,
}

/// A single entry in the fallback chain.
struct FallbackEntry {
    provider: Arc<dyn Provider>,
    model: String,
}

impl FallbackProvider {
    /// Create a new fallback provider with no entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Append a model served by `provider` to the chain.
    pub fn add(mut self, provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        self.chain.push(FallbackEntry {
            provider,
            model: model.into(),
        });
        self
    }

    /// Number of entries in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Model identifiers in attempt order.
    pub fn models(&self) -> Vec<&str> {
        self.chain.iter().map(|e| e.model.as_str()).collect()
    }
}

#[async_trait]
impl Provider for FallbackProvider {
    fn name(&self) -> &str {
        &self.name
    }

    /// The `model` field of the incoming request is ignored; each entry
    /// substitutes its own.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut last_error = ProviderError::NotConfigured("No models in fallback chain".into());

        for (i, entry) in self.chain.iter().enumerate() {
            info!(
                provider = %entry.provider.name(),
                model = %entry.model,
                attempt = i + 1,
                total = self.chain.len(),
                "Fallback: trying model"
            );

            let attempt = ProviderRequest {
                model: entry.model.clone(),
                ..request.clone()
            };

            match entry.provider.complete(attempt).await {
                Ok(mut response) => {
                    response.model = entry.model.clone();
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        model = %entry.model,
                        error = %e,
                        "Fallback: model failed, trying next"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        for entry in &self.chain {
            if let Ok(true) = entry.provider.health_check().await {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
