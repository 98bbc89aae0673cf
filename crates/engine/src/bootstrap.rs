//! Composition root: wires providers, stores and the engine from config.

use crate::ingest::TextIngestor;
use crate::orchestrator::{EngineSettings, HybridEngine};
use crate::orders::OrderIntake;
use salesrag_config::{AppConfig, StorageBackend};
use salesrag_core::audit::AuditSink;
use salesrag_core::embedding::Embedder;
use salesrag_core::error::{Error, Result, StoreError};
use salesrag_core::store::{OrderStore, VectorStore};
use salesrag_providers::{EmbedderCell, build_embedder, build_from_config};
use salesrag_store::{InMemoryAuditSink, InMemoryOrderStore, InMemoryVectorStore, SqliteStore};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The three persisted collaborators.
#[derive(Clone)]
pub struct Stores {
    pub vectors: Arc<dyn VectorStore>,
    pub orders: Arc<dyn OrderStore>,
    pub audit: Arc<dyn AuditSink>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            vectors: Arc::new(InMemoryVectorStore::new()),
            orders: Arc::new(InMemoryOrderStore::new()),
            audit: Arc::new(InMemoryAuditSink::new()),
        }
    }

    /// One SQLite database backing all three stores.
    pub async fn sqlite(database_url: &str) -> Result<Self> {
        ensure_parent_dir(database_url)?;
        let store = SqliteStore::new(database_url).await?;
        Ok(Self {
            vectors: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            audit: Arc::new(store),
        })
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        match config.storage.backend {
            StorageBackend::Memory => Ok(Self::in_memory()),
            StorageBackend::Sqlite => Self::sqlite(&config.storage.database_url).await,
        }
    }
}

/// Everything a front end needs to serve questions and ingest data.
pub struct Runtime {
    pub engine: Arc<HybridEngine>,
    pub ingestor: Arc<TextIngestor>,
    pub orders: Arc<OrderIntake>,
    pub stores: Stores,
    pub embedder: Arc<EmbedderCell>,
}

/// Build the runtime described by `config`. The embedding model is not
/// loaded until the first question or ingestion needs it.
pub async fn build_runtime(config: &AppConfig) -> Result<Runtime> {
    let stores = Stores::from_config(config).await?;
    build_runtime_with_stores(config, stores)
}

/// Same as [`build_runtime`], over caller-supplied stores.
pub fn build_runtime_with_stores(config: &AppConfig, stores: Stores) -> Result<Runtime> {
    let router = build_from_config(config);
    let completion =
        router.completion_chain(&config.llm.primary_model, &config.llm.fallback_model)?;
    let embedder = Arc::new(build_embedder(config, &router)?);

    let engine = HybridEngine::with_settings(
        embedder.clone(),
        stores.vectors.clone(),
        stores.orders.clone(),
        completion,
        stores.audit.clone(),
        EngineSettings::from_config(config),
    );
    let ingestor = Arc::new(TextIngestor::from_config(
        embedder.clone(),
        stores.vectors.clone(),
        &config.ingest,
    ));
    let orders = OrderIntake::new(stores.orders.clone(), ingestor.clone())
        .with_index_on_create(config.ingest.embed_orders);

    info!(
        provider = %config.default_provider,
        primary = %config.llm.primary_model,
        fallback = %config.llm.fallback_model,
        embedder = embedder.name(),
        vectors = stores.vectors.name(),
        orders = stores.orders.name(),
        "Runtime ready"
    );

    Ok(Runtime {
        engine: Arc::new(engine),
        ingestor,
        orders: Arc::new(orders),
        stores,
        embedder,
    })
}

/// Create the directory holding a file-backed SQLite database.
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    if path.contains(":memory:") {
        return Ok(());
    }
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::Store(StoreError::Storage(format!(
                "Cannot create {}: {e}",
                parent.display()
            )))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesrag_core::retrieval::AccessRole;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.api_key = Some("test-key".into());
        config
    }

    #[tokio::test]
    async fn memory_runtime_builds_without_loading_the_embedder() {
        let runtime = build_runtime(&memory_config()).await.unwrap();
        assert!(!runtime.embedder.is_initialized());
        assert_eq!(runtime.stores.vectors.name(), "in_memory");
        assert_eq!(runtime.stores.vectors.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_question_needs_no_backend() {
        let runtime = build_runtime(&memory_config()).await.unwrap();
        let response = runtime.engine.ask("  ", &AccessRole::default()).await.unwrap();
        assert_eq!(response.answer(), None);
        assert!(!runtime.embedder.is_initialized());
    }

    #[tokio::test]
    async fn order_intake_writes_to_the_runtime_order_store() {
        let mut config = memory_config();
        config.ingest.embed_orders = false;
        let runtime = build_runtime(&config).await.unwrap();

        let order = salesrag_core::order::NewSalesOrder {
            sales_order_number: "1234567".into(),
            items: vec![salesrag_core::order::OrderItem::new("Pump", 2.0, 450.0)],
            ..Default::default()
        };
        runtime.orders.create(&order).await.unwrap();

        let rows = runtime
            .stores
            .orders
            .find_by_numbers(&["1234567".into()])
            .await
            .unwrap();
        assert_eq!(rows[0].net_value, 900.0);
        assert!(!runtime.embedder.is_initialized());
    }

    #[tokio::test]
    async fn sqlite_runtime_creates_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("salesrag.db");

        let mut config = memory_config();
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.database_url = format!("sqlite://{}", db.display());

        let runtime = build_runtime(&config).await.unwrap();
        assert_eq!(runtime.stores.orders.name(), "sqlite");
        assert!(db.exists());
    }

    #[test]
    fn memory_url_needs_no_directory() {
        assert!(ensure_parent_dir("sqlite::memory:").is_ok());
    }
}
