//! Completion and embedding providers for salesrag.
//!
//! All completion backends implement `salesrag_core::Provider`; all
//! embedding backends implement `salesrag_core::Embedder`. The router builds
//! both from configuration.

pub mod embedder;
pub mod fallback;
#[cfg(feature = "local")]
pub mod local;
pub mod openai_compat;
pub mod router;

pub use embedder::{EmbedderCell, EmbedderFactory, EmbedderFuture, RemoteEmbedder};
pub use fallback::FallbackProvider;
#[cfg(feature = "local")]
pub use local::LocalEmbedder;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_embedder, build_from_config};
