//! Embedder trait: turns text into a fixed-length, L2-normalized vector.
//!
//! The engine treats the embedding model as a black box. Only the vector
//! retriever and the text ingestor call it; vectors are never persisted by
//! the query path.

use crate::error::ProviderError;
use async_trait::async_trait;

/// A dense embedding vector.
pub type EmbeddingVector = Vec<f32>;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Backend name for logs (e.g., "remote:text-embedding-3-small").
    fn name(&self) -> &str;

    /// Dimensionality of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError>;
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| (*v as f64) * (*v as f64)).sum::<f64>().sqrt();
    if norm < 1e-12 {
        return;
    }
    for v in vector.iter_mut() {
        *v = (*v as f64 / norm) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
