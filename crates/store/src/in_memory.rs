//! In-memory stores: useful for testing and ephemeral sessions.

use crate::vector;
use async_trait::async_trait;
use salesrag_core::audit::{AuditRecord, AuditSink};
use salesrag_core::error::StoreError;
use salesrag_core::retrieval::{SalesOrderRow, VectorHit};
use salesrag_core::store::{DocumentChunk, OrderStore, VectorStore};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Document chunks kept in a Vec, searched by brute-force cosine similarity.
pub struct InMemoryVectorStore {
    chunks: Arc<RwLock<Vec<DocumentChunk>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            chunks: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert(&self, chunk: DocumentChunk) -> Result<String, StoreError> {
        let id = chunk.id.clone();
        self.chunks.write().await.push(chunk);
        Ok(id)
    }

    async fn nearest(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorHit>, StoreError> {
        let chunks = self.chunks.read().await;
        Ok(vector::rank_by_similarity(
            chunks
                .iter()
                .map(|c| (c.content.as_str(), c.embedding.as_slice())),
            query_embedding,
            top_k,
        ))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.chunks.read().await.len())
    }
}

/// Sales orders keyed by order number. Later upserts replace earlier rows.
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Vec<SalesOrderRow>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Seed with rows (builder style).
    pub fn with_orders(rows: impl IntoIterator<Item = SalesOrderRow>) -> Self {
        Self {
            orders: Arc::new(RwLock::new(rows.into_iter().collect())),
        }
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn find_by_numbers(
        &self,
        order_numbers: &[String],
    ) -> Result<Vec<SalesOrderRow>, StoreError> {
        if order_numbers.is_empty() {
            return Ok(Vec::new());
        }
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|o| order_numbers.contains(&o.sales_order_number))
            .cloned()
            .collect())
    }

    async fn upsert(&self, order: &SalesOrderRow) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        match orders
            .iter_mut()
            .find(|o| o.sales_order_number == order.sales_order_number)
        {
            Some(existing) => *existing = order.clone(),
            None => orders.push(order.clone()),
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SalesOrderRow>, StoreError> {
        let mut rows = self.orders.read().await.clone();
        rows.sort_by(|a, b| a.sales_order_number.cmp(&b.sales_order_number));
        Ok(rows)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.orders.read().await.len())
    }
}

/// Audit records kept in append order.
pub struct InMemoryAuditSink {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Snapshot of everything appended so far.
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use salesrag_core::retrieval::Intent;

    fn order(number: &str, value: f64) -> SalesOrderRow {
        SalesOrderRow::new(number, value)
    }

    #[tokio::test]
    async fn vector_insert_and_nearest() {
        let store = InMemoryVectorStore::new();
        store
            .insert(DocumentChunk::new("Payment terms are net 30.", vec![1.0, 0.0], "doc.txt"))
            .await
            .unwrap();
        store
            .insert(DocumentChunk::new("Deliveries ship Mondays.", vec![0.0, 1.0], "doc.txt"))
            .await
            .unwrap();

        let hits = store.nearest(&[0.9, 0.1], 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "Payment terms are net 30.");
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn vector_nearest_on_empty_store() {
        let store = InMemoryVectorStore::default();
        assert!(store.nearest(&[1.0, 0.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orders_lookup_by_numbers() {
        let store = InMemoryOrderStore::with_orders([
            order("1234567", 1200.0),
            order("7654321", 90000.0),
            order("5555555", 10.0),
        ]);

        let rows = store
            .find_by_numbers(&["1234567".into(), "7654321".into(), "0000000".into()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(store.find_by_numbers(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn order_upsert_replaces_by_number() {
        let store = InMemoryOrderStore::new();
        store.upsert(&order("1234567", 1.0)).await.unwrap();
        store.upsert(&order("1234567", 2.0)).await.unwrap();
        assert_eq!(OrderStore::count(&store).await.unwrap(), 1);
        let rows = store.find_by_numbers(&["1234567".into()]).await.unwrap();
        assert_eq!(rows[0].net_value, 2.0);
    }

    #[tokio::test]
    async fn order_list_is_sorted_by_number() {
        let store = InMemoryOrderStore::with_orders([order("7654321", 2.0), order("1234567", 1.0)]);
        let numbers: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.sales_order_number)
            .collect();
        assert_eq!(numbers, vec!["1234567", "7654321"]);
    }

    #[tokio::test]
    async fn audit_sink_records_in_order() {
        let sink = InMemoryAuditSink::new();
        for i in 0..3 {
            sink.append(&AuditRecord {
                id: format!("a{i}"),
                created_at: Utc::now(),
                question: format!("q{i}"),
                intent: Intent::Vector,
                role: "SALES_REP".into(),
                structured_count: 0,
                vector_count: 1,
                top_score: Some(0.9),
                answer: "x".into(),
                prompt_tokens: 1,
                completion_tokens: 1,
                total_tokens: 2,
                model_used: "gpt-4o".into(),
            })
            .await
            .unwrap();
        }
        let ids: Vec<String> = sink.records().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a0", "a1", "a2"]);
    }
}
