//! Embedder implementations and the lazily-initialized shared handle.
//!
//! [`EmbedderCell`] owns a factory and builds the real embedder on first
//! use. Concurrent first callers wait on the same initialization instead of
//! each loading a model; a failed initialization leaves the cell empty so the
//! next call retries.

use async_trait::async_trait;
use salesrag_core::embedding::{Embedder, EmbeddingVector, l2_normalize};
use salesrag_core::error::ProviderError;
use salesrag_core::provider::{EmbeddingRequest, Provider};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Embeds text through a provider's `/embeddings` endpoint.
pub struct RemoteEmbedder {
    name: String,
    provider: Arc<dyn Provider>,
    model: String,
    dimensions: usize,
    send_dimensions: bool,
    normalize: bool,
}

impl RemoteEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, dimensions: usize) -> Self {
        let model = model.into();
        Self {
            name: format!("remote:{model}"),
            provider,
            model,
            dimensions,
            send_dimensions: true,
            normalize: true,
        }
    }

    /// Whether to ask the backend for `dimensions`-long vectors. When off,
    /// the backend's native length must already match.
    pub fn with_send_dimensions(mut self, send: bool) -> Self {
        self.send_dimensions = send;
        self
    }

    /// Toggle unit-length re-normalization of returned vectors.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: vec![text.to_string()],
                dimensions: self.send_dimensions.then_some(self.dimensions),
            })
            .await?;

        let mut vector =
            response
                .embeddings
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "Embedding response contained no vectors".into(),
                })?;

        if vector.len() != self.dimensions {
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.dimensions,
                    vector.len()
                ),
            });
        }

        if self.normalize {
            l2_normalize(&mut vector);
        }
        Ok(vector)
    }
}

/// Future returned by an [`EmbedderFactory`].
pub type EmbedderFuture =
    Pin<Box<dyn Future<Output = Result<Arc<dyn Embedder>, ProviderError>> + Send>>;

/// Builds the underlying embedder. Called at most once per successful init.
pub type EmbedderFactory = Box<dyn Fn() -> EmbedderFuture + Send + Sync>;

/// Memoized, single-flight embedder handle.
///
/// Cloning is not supported; share it behind an `Arc`.
pub struct EmbedderCell {
    name: String,
    dimensions: usize,
    cell: OnceCell<Arc<dyn Embedder>>,
    factory: EmbedderFactory,
}

impl EmbedderCell {
    pub fn new(name: impl Into<String>, dimensions: usize, factory: EmbedderFactory) -> Self {
        Self {
            name: name.into(),
            dimensions,
            cell: OnceCell::new(),
            factory,
        }
    }

    /// A cell that is already initialized with `embedder`.
    pub fn ready(embedder: Arc<dyn Embedder>) -> Self {
        let name = embedder.name().to_string();
        let dimensions = embedder.dimensions();
        Self {
            name,
            dimensions,
            cell: OnceCell::new_with(Some(embedder)),
            factory: Box::new(|| -> EmbedderFuture {
                Box::pin(async {
                    Err::<Arc<dyn Embedder>, _>(ProviderError::NotConfigured(
                        "Embedder cell has no factory".into(),
                    ))
                })
            }),
        }
    }

    /// Whether the underlying embedder has been built.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// The underlying embedder, building it on first call.
    pub async fn get(&self) -> Result<&Arc<dyn Embedder>, ProviderError> {
        self.cell
            .get_or_try_init(|| async {
                info!(embedder = %self.name, "Initializing embedder");
                let embedder = (self.factory)().await?;
                debug!(
                    embedder = %embedder.name(),
                    dimensions = embedder.dimensions(),
                    "Embedder ready"
                );
                Ok(embedder)
            })
            .await
    }
}

#[async_trait]
impl Embedder for EmbedderCell {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError> {
        self.get().await?.embed(text).await
    }
}
