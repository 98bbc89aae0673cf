//! Error types for the salesrag domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Business outcomes such as
//! "order not found" or "service unavailable" are *not* errors; they travel
//! as regular answers. Only genuine faults end up here.

use thiserror::Error;

/// The top-level error type for all salesrag operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors (completion + embedding backends) ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Store errors (vector, order, audit) ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Ingestion errors ---
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    // --- Order validation ---
    #[error("Invalid sales order: {0}")]
    Order(#[from] OrderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Cannot read source {path}: {reason}")]
    SourceUnreadable { path: String, reason: String },
}

/// Reasons a new sales order is refused. Nothing is stored when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Sales order number is required")]
    MissingOrderNumber,

    #[error("Sales order must contain at least one item")]
    NoItems,

    #[error("Invalid Quantity for item {position}")]
    InvalidQuantity { position: String },

    #[error("Invalid Price for item {position}")]
    InvalidPrice { position: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn store_error_converts_into_top_level() {
        let err: Error = StoreError::QueryFailed("no such table: sales_orders".into()).into();
        assert!(matches!(err, Error::Store(_)));
        assert!(err.to_string().contains("sales_orders"));
    }

    #[test]
    fn order_error_names_the_item() {
        let err: Error = OrderError::InvalidPrice {
            position: "000020".into(),
        }
        .into();
        assert!(matches!(err, Error::Order(_)));
        assert_eq!(err.to_string(), "Invalid sales order: Invalid Price for item 000020");
    }

    #[test]
    fn ingest_error_names_the_path() {
        let err = Error::Ingest(IngestError::SourceUnreadable {
            path: "sales_context.txt".into(),
            reason: "No such file".into(),
        });
        assert!(err.to_string().contains("sales_context.txt"));
    }
}
