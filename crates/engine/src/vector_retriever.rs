//! Vector retrieval: embed the question, fetch the nearest chunks, then
//! tighten the candidate list.
//!
//! Refinement runs in this order:
//! 1. keep hits scoring at least `relative_threshold` × the top score
//! 2. drop repeated content, keeping the first (best-ranked) copy
//! 3. re-sort by descending score
//! 4. if the top hit leads the runner-up by more than `gap_margin`, keep only the top hit

use salesrag_core::embedding::Embedder;
use salesrag_core::error::Result;
use salesrag_core::retrieval::VectorHit;
use salesrag_core::store::VectorStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Tuning for [`refine_hits`] and the store query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorSearchSettings {
    pub top_k: usize,
    pub relative_threshold: f32,
    pub gap_margin: f32,
}

impl Default for VectorSearchSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            relative_threshold: 0.80,
            gap_margin: 0.15,
        }
    }
}

/// Apply threshold, dedup, re-sort and gap pruning to score-descending `hits`.
pub fn refine_hits(hits: Vec<VectorHit>, settings: &VectorSearchSettings) -> Vec<VectorHit> {
    let Some(top_score) = hits.first().map(|h| h.score) else {
        return Vec::new();
    };
    let threshold = top_score * settings.relative_threshold;

    let mut seen: HashSet<String> = HashSet::new();
    let mut refined: Vec<VectorHit> = hits
        .into_iter()
        .filter(|h| h.score >= threshold)
        .filter(|h| seen.insert(h.content.clone()))
        .collect();

    refined.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if refined.len() >= 2 && refined[0].score - refined[1].score > settings.gap_margin {
        refined.truncate(1);
    }

    refined
}

/// Semantic search over the document corpus.
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    settings: VectorSearchSettings,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            settings: VectorSearchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: VectorSearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Embedding and store failures propagate.
    pub async fn search(&self, question: &str) -> Result<Vec<VectorHit>> {
        let embedding = self.embedder.embed(question).await?;
        let candidates = self.store.nearest(&embedding, self.settings.top_k).await?;
        let fetched = candidates.len();

        let hits = refine_hits(candidates, &self.settings);

        debug!(
            fetched,
            kept = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "Vector search complete"
        );
        Ok(hits)
    }
}
