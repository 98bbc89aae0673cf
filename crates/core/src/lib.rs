//! # salesrag core
//!
//! Domain types, traits, and error definitions for the salesrag hybrid
//! retrieval engine. This crate has **no framework dependencies**: it defines
//! the domain model that all other crates implement against.
//!
//! ## Design
//!
//! Every external collaborator (completion provider, embedder, vector store,
//! order store, audit sink) is a trait here. Implementations live in their
//! respective crates, so the engine can be exercised end-to-end with test
//! doubles and wired to real backends purely by configuration.

pub mod answer;
pub mod audit;
pub mod embedding;
pub mod error;
pub mod message;
pub mod order;
pub mod provider;
pub mod retrieval;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use answer::{AnswerResult, AskResponse, TokenUsage, outcomes};
pub use audit::{AuditRecord, AuditSink};
pub use embedding::{Embedder, EmbeddingVector};
pub use error::{Error, OrderError, Result};
pub use message::{Message, Role};
pub use order::{NewSalesOrder, OrderItem};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use retrieval::{AccessRole, Intent, SalesOrderRow, VectorHit};
pub use store::{DocumentChunk, OrderStore, VectorStore};
