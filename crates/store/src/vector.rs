//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and brute-force top-K ranking, shared by the
//! in-memory and SQLite vector stores.

use salesrag_core::retrieval::VectorHit;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ or either vector is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank `(content, embedding)` pairs by similarity to `query_embedding`.
///
/// Returns at most `top_k` hits in descending score order. The sort is
/// stable, so equal scores keep the order in which candidates were supplied.
pub fn rank_by_similarity<'a, I>(candidates: I, query_embedding: &[f32], top_k: usize) -> Vec<VectorHit>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    if top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<VectorHit> = candidates
        .into_iter()
        .map(|(content, embedding)| {
            VectorHit::new(content, cosine_similarity(embedding, query_embedding))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);
    scored
}
