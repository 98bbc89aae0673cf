//! SQLite backend for all three stores.
//!
//! Uses a single SQLite database file with three tables:
//! - `document_embeddings`: chunk text plus its embedding as an f32-LE blob
//! - `sales_orders`: the reporting view of sales orders, keyed by number
//! - `ai_audit_log`: one row per synthesized answer
//!
//! Nearest-neighbour search is a brute-force scan over stored blobs.

use crate::vector;
use async_trait::async_trait;
use chrono::Utc;
use salesrag_core::audit::{AuditRecord, AuditSink};
use salesrag_core::error::StoreError;
use salesrag_core::retrieval::{Intent, SalesOrderRow, VectorHit};
use salesrag_core::store::{DocumentChunk, OrderStore, VectorStore};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A SQLite-backed vector store, order store and audit sink.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `url` and run migrations.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database.
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // An in-memory database exists per connection; keep exactly one.
        let max_connections = if url.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {url}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create tables and indexes. Idempotent.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS document_embeddings (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                source TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS sales_orders (
                sales_order_number TEXT PRIMARY KEY,
                customer_name TEXT,
                netwr REAL NOT NULL,
                currency TEXT,
                item_text TEXT,
                quantity REAL,
                net_price REAL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS ai_audit_log (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                question TEXT NOT NULL,
                intent TEXT NOT NULL,
                role TEXT NOT NULL,
                structured_count INTEGER NOT NULL,
                vector_count INTEGER NOT NULL,
                top_score REAL,
                answer TEXT NOT NULL,
                prompt_tokens INTEGER NOT NULL,
                completion_tokens INTEGER NOT NULL,
                total_tokens INTEGER NOT NULL,
                model_used TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_audit_created_at ON ai_audit_log(created_at DESC)",
        ];

        for sql in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Serialize an embedding vector to bytes.
    fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize an f32-LE blob. Trailing partial values are ignored.
    fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<SalesOrderRow, StoreError> {
        let col = |name: &str, e: sqlx::Error| StoreError::QueryFailed(format!("{name} column: {e}"));

        Ok(SalesOrderRow {
            sales_order_number: row
                .try_get("sales_order_number")
                .map_err(|e| col("sales_order_number", e))?,
            customer_name: row
                .try_get("customer_name")
                .map_err(|e| col("customer_name", e))?,
            net_value: row.try_get("netwr").map_err(|e| col("netwr", e))?,
            currency: row.try_get("currency").map_err(|e| col("currency", e))?,
            item_text: row.try_get("item_text").map_err(|e| col("item_text", e))?,
            quantity: row.try_get("quantity").map_err(|e| col("quantity", e))?,
            net_price: row.try_get("net_price").map_err(|e| col("net_price", e))?,
        })
    }

    fn row_to_audit(row: &sqlx::sqlite::SqliteRow) -> Result<AuditRecord, StoreError> {
        let col = |name: &str, e: sqlx::Error| StoreError::QueryFailed(format!("{name} column: {e}"));

        let created_at_str: String = row.try_get("created_at").map_err(|e| col("created_at", e))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::QueryFailed(format!("created_at value: {e}")))?;

        let intent_str: String = row.try_get("intent").map_err(|e| col("intent", e))?;
        let intent = Intent::from_str(&intent_str).map_err(StoreError::QueryFailed)?;

        let count = |name: &str| -> Result<usize, StoreError> {
            let v: i64 = row.try_get(name).map_err(|e| col(name, e))?;
            Ok(v.max(0) as usize)
        };
        let tokens = |name: &str| -> Result<u32, StoreError> {
            let v: i64 = row.try_get(name).map_err(|e| col(name, e))?;
            Ok(v.clamp(0, u32::MAX as i64) as u32)
        };
        let top_score: Option<f64> = row.try_get("top_score").map_err(|e| col("top_score", e))?;

        Ok(AuditRecord {
            id: row.try_get("id").map_err(|e| col("id", e))?,
            created_at,
            question: row.try_get("question").map_err(|e| col("question", e))?,
            intent,
            role: row.try_get("role").map_err(|e| col("role", e))?,
            structured_count: count("structured_count")?,
            vector_count: count("vector_count")?,
            top_score: top_score.map(|s| s as f32),
            answer: row.try_get("answer").map_err(|e| col("answer", e))?,
            prompt_tokens: tokens("prompt_tokens")?,
            completion_tokens: tokens("completion_tokens")?,
            total_tokens: tokens("total_tokens")?,
            model_used: row.try_get("model_used").map_err(|e| col("model_used", e))?,
        })
    }

    /// Most recent audit records, newest first.
    pub async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError> {
        let rows = sqlx::query("SELECT * FROM ai_audit_log ORDER BY created_at DESC LIMIT ?1")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_audit).collect()
    }

    /// Number of audit records.
    pub async fn audit_count(&self) -> Result<usize, StoreError> {
        self.count_table("ai_audit_log").await
    }

    async fn count_table(&self, table: &'static str) -> Result<usize, StoreError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS cnt FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, chunk: DocumentChunk) -> Result<String, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO document_embeddings (id, content, embedding, source, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&chunk.id)
        .bind(&chunk.content)
        .bind(Self::embedding_to_blob(&chunk.embedding))
        .bind(&chunk.source)
        .bind(chunk.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Insert chunk failed: {e}")))?;

        Ok(chunk.id)
    }

    async fn nearest(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorHit>, StoreError> {
        let rows = sqlx::query("SELECT content, embedding FROM document_embeddings ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let mut candidates: Vec<(String, Vec<f32>)> = Vec::with_capacity(rows.len());
        for row in &rows {
            let content: String = row
                .try_get("content")
                .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
            let blob: Vec<u8> = row
                .try_get("embedding")
                .map_err(|e| StoreError::QueryFailed(format!("embedding column: {e}")))?;
            candidates.push((content, Self::blob_to_embedding(&blob)));
        }

        debug!(scanned = candidates.len(), top_k, "SQLite vector scan");

        Ok(vector::rank_by_similarity(
            candidates.iter().map(|(c, e)| (c.as_str(), e.as_slice())),
            query_embedding,
            top_k,
        ))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.count_table("document_embeddings").await
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find_by_numbers(
        &self,
        order_numbers: &[String],
    ) -> Result<Vec<SalesOrderRow>, StoreError> {
        if order_numbers.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=order_numbers.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT * FROM sales_orders WHERE sales_order_number IN ({placeholders}) \
             ORDER BY sales_order_number"
        );

        let mut query = sqlx::query(&sql);
        for number in order_numbers {
            query = query.bind(number);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn upsert(&self, order: &SalesOrderRow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sales_orders
                (sales_order_number, customer_name, netwr, currency, item_text, quantity, net_price, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(sales_order_number) DO UPDATE SET
                customer_name = excluded.customer_name,
                netwr = excluded.netwr,
                currency = excluded.currency,
                item_text = excluded.item_text,
                quantity = excluded.quantity,
                net_price = excluded.net_price
            "#,
        )
        .bind(&order.sales_order_number)
        .bind(order.customer_name.as_deref())
        .bind(order.net_value)
        .bind(order.currency.as_deref())
        .bind(order.item_text.as_deref())
        .bind(order.quantity)
        .bind(order.net_price)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Upsert order failed: {e}")))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<SalesOrderRow>, StoreError> {
        let rows = sqlx::query("SELECT * FROM sales_orders ORDER BY sales_order_number")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.count_table("sales_orders").await
    }
}

#[async_trait]
impl AuditSink for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ai_audit_log
                (id, created_at, question, intent, role, structured_count, vector_count,
                 top_score, answer, prompt_tokens, completion_tokens, total_tokens, model_used)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&record.id)
        .bind(record.created_at.to_rfc3339())
        .bind(&record.question)
        .bind(record.intent.as_str())
        .bind(&record.role)
        .bind(record.structured_count as i64)
        .bind(record.vector_count as i64)
        .bind(record.top_score.map(|s| s as f64))
        .bind(&record.answer)
        .bind(record.prompt_tokens as i64)
        .bind(record.completion_tokens as i64)
        .bind(record.total_tokens as i64)
        .bind(&record.model_used)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Audit insert failed: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    fn audit(id: &str, intent: Intent) -> AuditRecord {
        AuditRecord {
            id: id.into(),
            created_at: Utc::now(),
            question: "What is the value of order 1234567?".into(),
            intent,
            role: "RISK_MANAGER".into(),
            structured_count: 1,
            vector_count: 0,
            top_score: None,
            answer: "Order 1234567 has a net value of 75,000 EUR.".into(),
            prompt_tokens: 300,
            completion_tokens: 20,
            total_tokens: 320,
            model_used: "gpt-4o-mini".into(),
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let store = test_store().await;
        store.run_migrations().await.unwrap();
        assert_eq!(VectorStore::count(&store).await.unwrap(), 0);
        assert_eq!(OrderStore::count(&store).await.unwrap(), 0);
        assert_eq!(store.audit_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn embedding_blob_round_trip() {
        let v = vec![0.25f32, -1.5, 3.0e-7];
        let blob = SqliteStore::embedding_to_blob(&v);
        assert_eq!(blob.len(), 12);
        assert_eq!(SqliteStore::blob_to_embedding(&blob), v);
    }

    #[tokio::test]
    async fn insert_and_nearest() {
        let store = test_store().await;
        store
            .insert(DocumentChunk::new("Credit limit policy", vec![1.0, 0.0, 0.0], "ctx.txt"))
            .await
            .unwrap();
        store
            .insert(DocumentChunk::new("Delivery schedule", vec![0.0, 1.0, 0.0], "ctx.txt"))
            .await
            .unwrap();
        store
            .insert(DocumentChunk::new("Returns process", vec![0.0, 0.0, 1.0], "ctx.txt"))
            .await
            .unwrap();

        let hits = store.nearest(&[0.8, 0.6, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "Credit limit policy");
        assert!((hits[0].score - 0.8).abs() < 1e-5);
        assert_eq!(hits[1].content, "Delivery schedule");
        assert_eq!(VectorStore::count(&store).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn find_orders_by_numbers() {
        let store = test_store().await;
        let mut big = SalesOrderRow::new("7654321", 90000.0);
        big.customer_name = Some("Globex".into());
        big.currency = Some("EUR".into());
        store.upsert(&SalesOrderRow::new("1234567", 1200.0)).await.unwrap();
        store.upsert(&big).await.unwrap();

        let rows = store
            .find_by_numbers(&["7654321".into(), "9999999".into()])
            .await
            .unwrap();
        assert_eq!(rows, vec![big]);

        assert!(store.find_by_numbers(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_orders_sorted_by_number() {
        let store = test_store().await;
        store.upsert(&SalesOrderRow::new("7654321", 2.0)).await.unwrap();
        store.upsert(&SalesOrderRow::new("1234567", 1.0)).await.unwrap();

        let rows = store.list().await.unwrap();
        let numbers: Vec<&str> = rows.iter().map(|r| r.sales_order_number.as_str()).collect();
        assert_eq!(numbers, vec!["1234567", "7654321"]);
    }

    #[tokio::test]
    async fn upsert_order_replaces() {
        let store = test_store().await;
        store.upsert(&SalesOrderRow::new("1234567", 1.0)).await.unwrap();
        store.upsert(&SalesOrderRow::new("1234567", 2.0)).await.unwrap();

        assert_eq!(OrderStore::count(&store).await.unwrap(), 1);
        let rows = store.find_by_numbers(&["1234567".into()]).await.unwrap();
        assert_eq!(rows[0].net_value, 2.0);
    }

    #[tokio::test]
    async fn audit_append_and_list() {
        let store = test_store().await;
        let mut record = audit("a1", Intent::Structured);
        record.top_score = Some(0.91);
        store.append(&record).await.unwrap();
        store.append(&audit("a2", Intent::Hybrid)).await.unwrap();

        assert_eq!(store.audit_count().await.unwrap(), 2);
        let recent = store.recent_audit(10).await.unwrap();
        assert_eq!(recent.len(), 2);

        let first = recent.iter().find(|r| r.id == "a1").unwrap();
        assert_eq!(first.intent, Intent::Structured);
        assert_eq!(first.role, "RISK_MANAGER");
        assert_eq!(first.model_used, "gpt-4o-mini");
        assert_eq!(first.total_tokens, 320);
        assert!((first.top_score.unwrap() - 0.91).abs() < 1e-6);
    }

    #[tokio::test]
    async fn file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("salesrag.db").display());

        {
            let store = SqliteStore::new(&url).await.unwrap();
            store.upsert(&SalesOrderRow::new("1234567", 5.0)).await.unwrap();
        }

        let reopened = SqliteStore::new(&url).await.unwrap();
        assert_eq!(OrderStore::count(&reopened).await.unwrap(), 1);
    }
}
