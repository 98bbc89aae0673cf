//! Text ingestion: chunk a source document, embed each chunk, store it.
//!
//! Chunks are contiguous, non-overlapping and inserted in document order,
//! all tagged with the same source label.

use salesrag_config::IngestConfig;
use salesrag_core::embedding::Embedder;
use salesrag_core::error::{IngestError, Result};
use salesrag_core::store::{DocumentChunk, VectorStore};
use salesrag_store::chunk_text;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub struct TextIngestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
    source_label: String,
}

impl TextIngestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chunk_size: usize,
        source_label: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            chunk_size,
            source_label: source_label.into(),
        }
    }

    pub fn from_config(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        config: &IngestConfig,
    ) -> Self {
        Self::new(embedder, store, config.chunk_size, config.label())
    }

    /// Chunk, embed and insert `text`. Returns the number of chunks stored.
    ///
    /// Stops at the first embedding or store failure; chunks inserted before
    /// the failure stay in the store.
    pub async fn load_text(&self, text: &str) -> Result<usize> {
        let chunks = chunk_text(text, self.chunk_size);
        let mut inserted = 0;

        for content in chunks {
            let embedding = self.embedder.embed(&content).await?;
            let id = self
                .store
                .insert(DocumentChunk::new(content, embedding, &self.source_label))
                .await?;
            debug!(id = %id, "Stored chunk");
            inserted += 1;
        }

        info!(
            source = %self.source_label,
            store = self.store.name(),
            "Inserted {inserted} chunks"
        );
        Ok(inserted)
    }

    /// Embed and insert `content` as one chunk under `source`, without
    /// splitting it. Returns the stored chunk ID.
    pub async fn load_document(&self, content: &str, source: &str) -> Result<String> {
        let embedding = self.embedder.embed(content).await?;
        let id = self
            .store
            .insert(DocumentChunk::new(content, embedding, source))
            .await?;
        debug!(id = %id, source, "Stored document");
        Ok(id)
    }

    /// Read `path` as UTF-8 and ingest it.
    pub async fn load_file(&self, path: &Path) -> Result<usize> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IngestError::SourceUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        self.load_text(&text).await
    }
}
