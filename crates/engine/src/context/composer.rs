//! Context composer: merges retrieval output into the text handed to the model.
//!
//! Layout:
//!
//! ```text
//! Structured SAP Data:
//! <pretty JSON array of rows, or nothing>
//!
//! Relevant Documents:
//! <one hit content per line, or nothing>
//! ```

use super::token::estimate_tokens;
use salesrag_core::error::Result;
use salesrag_core::retrieval::{SalesOrderRow, VectorHit};

pub const STRUCTURED_HEADER: &str = "Structured SAP Data";
pub const DOCUMENTS_HEADER: &str = "Relevant Documents";

/// Default budget for the composed context.
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 3000;

#[derive(Debug, Clone)]
pub struct ContextComposer {
    max_context_tokens: usize,
}

impl ContextComposer {
    pub fn new(max_context_tokens: usize) -> Self {
        Self { max_context_tokens }
    }

    pub fn max_context_tokens(&self) -> usize {
        self.max_context_tokens
    }

    /// Build the two-section context. Deterministic.
    pub fn compose(&self, rows: &[SalesOrderRow], hits: &[VectorHit]) -> Result<String> {
        let structured = if rows.is_empty() {
            String::new()
        } else {
            serde_json::to_string_pretty(rows)?
        };

        let documents = hits
            .iter()
            .map(|h| h.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!(
            "{STRUCTURED_HEADER}:\n{structured}\n\n{DOCUMENTS_HEADER}:\n{documents}"
        ))
    }

    /// Whether `context` is over budget and must not reach the model.
    pub fn exceeds_budget(&self, context: &str) -> bool {
        estimate_tokens(context) > self.max_context_tokens
    }
}

impl Default for ContextComposer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_TOKENS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_sections_present() {
        let mut row = SalesOrderRow::new("1234567", 1200.0);
        row.currency = Some("EUR".into());
        let hits = vec![
            VectorHit::new("Payment terms are net 30.", 0.9),
            VectorHit::new("Discounts need approval.", 0.85),
        ];

        let ctx = ContextComposer::default().compose(&[row], &hits).unwrap();

        assert!(ctx.starts_with("Structured SAP Data:\n["));
        assert!(ctx.contains("\"SalesOrderNumber\": \"1234567\""));
        assert!(ctx.contains("\"NETWR\": 1200.0"));
        assert!(ctx.contains("\"WAERK\": \"EUR\""));
        assert!(ctx.ends_with(
            "Relevant Documents:\nPayment terms are net 30.\nDiscounts need approval."
        ));
    }

    #[test]
    fn empty_sections_keep_headers() {
        let ctx = ContextComposer::default().compose(&[], &[]).unwrap();
        assert_eq!(ctx, "Structured SAP Data:\n\n\nRelevant Documents:\n");
    }

    #[test]
    fn composition_is_deterministic() {
        let composer = ContextComposer::default();
        let rows = vec![SalesOrderRow::new("1234567", 1.0)];
        let hits = vec![VectorHit::new("a", 0.5)];
        assert_eq!(
            composer.compose(&rows, &hits).unwrap(),
            composer.compose(&rows, &hits).unwrap()
        );
    }

    #[test]
    fn budget_boundary() {
        let composer = ContextComposer::new(3000);
        assert!(!composer.exceeds_budget(&"x".repeat(12_000)));
        assert!(composer.exceeds_budget(&"x".repeat(12_001)));
    }
}
