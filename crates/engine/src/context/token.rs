//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, counted in
//! Unicode scalar values. Accurate within ~10% for BPE tokenizers on English
//! text, which is all the budget guard needs.

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
