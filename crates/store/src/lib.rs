//! Stores for salesrag: document vectors, sales orders and the audit log.
//!
//! Backends:
//! - **SQLite** (default): one database file holding all three tables
//! - **In-memory**: for development and tests

pub mod chunker;
pub mod in_memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod vector;

pub use chunker::chunk_text;
pub use in_memory::{InMemoryAuditSink, InMemoryOrderStore, InMemoryVectorStore};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
