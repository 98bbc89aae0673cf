//! Structured retrieval: exact lookup of every order number the question
//! mentions, scoped by the requester's role.

use crate::order_numbers::extract_order_numbers;
use salesrag_core::error::Result;
use salesrag_core::retrieval::{AccessRole, SalesOrderRow};
use salesrag_core::store::OrderStore;
use std::sync::Arc;
use tracing::debug;

/// Default net-value boundary between sales-rep and risk-manager visibility.
pub const DEFAULT_HIGH_VALUE_THRESHOLD: f64 = 50_000.0;

pub struct StructuredRetriever {
    store: Arc<dyn OrderStore>,
    high_value_threshold: f64,
}

impl StructuredRetriever {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self {
            store,
            high_value_threshold: DEFAULT_HIGH_VALUE_THRESHOLD,
        }
    }

    pub fn with_high_value_threshold(mut self, threshold: f64) -> Self {
        self.high_value_threshold = threshold;
        self
    }

    /// Rows for the referenced orders that `role` may see. Store failures propagate.
    pub async fn search(&self, question: &str, role: &AccessRole) -> Result<Vec<SalesOrderRow>> {
        let numbers = extract_order_numbers(question);
        if numbers.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.store.find_by_numbers(&numbers).await?;
        let found = rows.len();

        let visible: Vec<SalesOrderRow> = rows
            .into_iter()
            .filter(|row| role.admits(row.net_value, self.high_value_threshold))
            .collect();

        debug!(
            requested = numbers.len(),
            found,
            visible = visible.len(),
            role = %role,
            "Structured search complete"
        );
        Ok(visible)
    }
}
