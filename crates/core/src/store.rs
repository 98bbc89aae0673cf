//! Store traits: the persisted collaborators the engine reads from.
//!
//! The vector store and the order store are maintained independently; the
//! engine never assumes they agree with each other.

use crate::embedding::EmbeddingVector;
use crate::error::StoreError;
use crate::retrieval::{SalesOrderRow, VectorHit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One indexed chunk of a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique ID for this chunk
    pub id: String,

    /// The chunk text
    pub content: String,

    /// Embedding of `content`
    #[serde(skip)]
    pub embedding: EmbeddingVector,

    /// Source identifier (usually the file name)
    pub source: String,

    /// When this chunk was stored
    pub created_at: DateTime<Utc>,
}

impl DocumentChunk {
    pub fn new(
        content: impl Into<String>,
        embedding: EmbeddingVector,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            embedding,
            source: source.into(),
            created_at: Utc::now(),
        }
    }
}

/// Nearest-neighbour search over embedded document chunks.
///
/// Implementations: SQLite (blob scan), in-memory (for testing).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Insert a chunk. Returns its ID.
    async fn insert(&self, chunk: DocumentChunk) -> Result<String, StoreError>;

    /// Up to `top_k` hits ordered by descending cosine similarity.
    /// Ties keep store-native order.
    async fn nearest(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorHit>, StoreError>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize, StoreError>;
}

/// Sales orders keyed by order number.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// All rows whose order number is in `order_numbers`. Order is store-defined.
    async fn find_by_numbers(
        &self,
        order_numbers: &[String],
    ) -> Result<Vec<SalesOrderRow>, StoreError>;

    /// Insert a row, replacing any row with the same order number.
    async fn upsert(&self, order: &SalesOrderRow) -> Result<(), StoreError>;

    /// Every stored row, ordered by order number.
    async fn list(&self) -> Result<Vec<SalesOrderRow>, StoreError>;

    /// Number of stored orders.
    async fn count(&self) -> Result<usize, StoreError>;
}
