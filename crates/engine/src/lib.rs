//! # salesrag engine
//!
//! Answers natural-language questions over sales-order data by combining
//! exact order lookup with semantic search over a document corpus, then
//! asking a completion model to answer strictly from what was retrieved.
//!
//! ## Architecture
//!
//! ```text
//! question ──▶ IntentClassifier ──▶ StructuredRetriever ─┐
//!                                 └▶ VectorRetriever ────┤
//!                                                        ▼
//!                 AuditRecorder ◀── AnswerSynthesizer ◀── ContextComposer
//! ```
//!
//! [`HybridEngine`] owns one of each and runs the whole pass; the
//! [`bootstrap`] module builds it from an `AppConfig`. [`TextIngestor`] and
//! [`OrderIntake`] fill the stores it reads from.

pub mod audit;
pub mod bootstrap;
pub mod context;
pub mod ingest;
pub mod intent;
pub mod orchestrator;
pub mod order_numbers;
pub mod orders;
pub mod structured_retriever;
pub mod synthesizer;
pub mod vector_retriever;

#[cfg(test)]
mod test_helpers;

pub use audit::{AnsweredQuestion, AuditRecorder};
pub use bootstrap::{Runtime, Stores, build_runtime, build_runtime_with_stores};
pub use context::{ContextComposer, estimate_tokens};
pub use ingest::TextIngestor;
pub use intent::{IntentClassifier, KeywordIntentClassifier, SEMANTIC_KEYWORDS};
pub use orchestrator::{EngineSettings, HybridEngine};
pub use order_numbers::{contains_order_number, extract_order_numbers};
pub use orders::{OrderIntake, OrderPricing, order_row, price_order, render_order_document};
pub use structured_retriever::StructuredRetriever;
pub use synthesizer::{AnswerSynthesizer, Synthesis};
pub use vector_retriever::{VectorRetriever, VectorSearchSettings, refine_hits};
