//! Provider router: selects the correct backend based on config.
//!
//! Handles provider creation and assembles the two things the engine needs:
//! the primary/fallback completion chain and the lazily-built embedder.

use crate::embedder::{EmbedderCell, EmbedderFuture, RemoteEmbedder};
use crate::fallback::FallbackProvider;
use crate::openai_compat::OpenAiCompatProvider;
use salesrag_config::{AppConfig, EmbeddingBackend};
use salesrag_core::embedding::Embedder;
use salesrag_core::error::ProviderError;
use salesrag_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Routes requests to named providers.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Resolve a model reference like `"ollama/llama3"` to a provider and a
    /// bare model name. Unprefixed names go to the default provider.
    pub fn resolve(&self, model: &str) -> Option<(Arc<dyn Provider>, String)> {
        if let Some((prefix, rest)) = model.split_once('/') {
            if let Some(provider) = self.get(prefix) {
                return Some((provider, rest.to_string()));
            }
        }
        self.default().map(|p| (p, model.to_string()))
    }

    /// Primary model first, fallback second.
    pub fn completion_chain(
        &self,
        primary_model: &str,
        fallback_model: &str,
    ) -> Result<FallbackProvider, ProviderError> {
        let mut chain = FallbackProvider::new("completion");
        for model in [primary_model, fallback_model] {
            let (provider, bare) = self.resolve(model).ok_or_else(|| {
                ProviderError::NotConfigured(format!("No provider available for model '{model}'"))
            })?;
            chain = chain.add(provider, bare);
        }
        Ok(chain)
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    let timeout = Duration::from_secs(config.llm.request_timeout_secs);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        let provider = OpenAiCompatProvider::new(name, &base_url, &api_key).with_timeout(timeout);
        router.register(name.clone(), Arc::new(provider));
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);
        router.register(
            config.default_provider.clone(),
            Arc::new(
                OpenAiCompatProvider::new(&config.default_provider, &base_url, &api_key)
                    .with_timeout(timeout),
            ),
        );
    }

    router
}

/// Build the shared embedder handle. Nothing is loaded until first use.
pub fn build_embedder(
    config: &AppConfig,
    router: &ProviderRouter,
) -> Result<EmbedderCell, ProviderError> {
    let embedding = &config.embedding;

    match embedding.backend {
        EmbeddingBackend::Remote => {
            let (provider, model) = router.resolve(&embedding.model).ok_or_else(|| {
                ProviderError::NotConfigured("No provider available for embeddings".into())
            })?;
            let dimensions = embedding.dimensions;
            let normalize = embedding.normalize;
            let send_dimensions = embedding.send_dimensions;
            let label = format!("remote:{model}");

            Ok(EmbedderCell::new(
                label,
                dimensions,
                Box::new(move || -> EmbedderFuture {
                    let embedder = RemoteEmbedder::new(provider.clone(), model.clone(), dimensions)
                        .with_send_dimensions(send_dimensions)
                        .with_normalize(normalize);
                    Box::pin(async move { Ok::<Arc<dyn Embedder>, ProviderError>(Arc::new(embedder)) })
                }),
            ))
        }
        EmbeddingBackend::Local => build_local_embedder(config),
    }
}

#[cfg(feature = "local")]
fn build_local_embedder(config: &AppConfig) -> Result<EmbedderCell, ProviderError> {
    use crate::local::{DEFAULT_LOCAL_MODEL, LocalEmbedder};

    let model = if config.embedding.model.contains('/') {
        config.embedding.model.clone()
    } else {
        DEFAULT_LOCAL_MODEL.to_string()
    };
    let label = format!("local:{model}");

    Ok(EmbedderCell::new(
        label,
        config.embedding.dimensions,
        Box::new(move || -> EmbedderFuture {
            let model = model.clone();
            Box::pin(async move {
                let embedder = tokio::task::spawn_blocking(move || LocalEmbedder::load(&model))
                    .await
                    .map_err(|e| ProviderError::ApiError {
                        status_code: 500,
                        message: format!("Model loading task failed: {e}"),
                    })??;
                Ok::<Arc<dyn Embedder>, ProviderError>(Arc::new(embedder))
            })
        }),
    ))
}

#[cfg(not(feature = "local"))]
fn build_local_embedder(_config: &AppConfig) -> Result<EmbedderCell, ProviderError> {
    Err(ProviderError::NotConfigured(
        "Local embeddings require building with the `local` feature".into(),
    ))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "azure" => "https://api.openai.azure.com/openai/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesrag_config::ProviderConfig;

    fn openai() -> Arc<dyn Provider> {
        Arc::new(OpenAiCompatProvider::new("openai", default_base_url("openai"), "sk-test"))
    }

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", openai());

        assert!(router.get("openai").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
    }

    #[test]
    fn resolve_prefixed_and_bare_models() {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", openai());
        router.register(
            "ollama",
            Arc::new(OpenAiCompatProvider::new("ollama", default_base_url("ollama"), "ollama")),
        );

        let (p, model) = router.resolve("ollama/llama3").unwrap();
        assert_eq!(p.name(), "ollama");
        assert_eq!(model, "llama3");

        let (p, model) = router.resolve("gpt-4o").unwrap();
        assert_eq!(p.name(), "openai");
        assert_eq!(model, "gpt-4o");

        // Unknown prefixes are part of the model name
        let (p, model) = router.resolve("meta-llama/Llama-3-8b").unwrap();
        assert_eq!(p.name(), "openai");
        assert_eq!(model, "meta-llama/Llama-3-8b");
    }

    #[test]
    fn completion_chain_orders_primary_then_fallback() {
        let router = build_from_config(&AppConfig::default());
        let chain = router.completion_chain("gpt-4o", "gpt-4o-mini").unwrap();
        assert_eq!(chain.models(), vec!["gpt-4o", "gpt-4o-mini"]);
    }

    #[test]
    fn completion_chain_without_default_provider_fails() {
        let router = ProviderRouter::new("missing");
        assert!(router.completion_chain("a", "b").is_err());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        assert!(router.default().is_some());
    }

    #[test]
    fn configured_provider_uses_custom_url() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: None,
                api_url: Some("http://gpu-box:11434/v1".into()),
            },
        );
        let router = build_from_config(&config);
        assert!(router.get("ollama").is_some());
        assert!(router.get("openai").is_some());
    }

    #[tokio::test]
    async fn remote_embedder_is_lazy() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        let cell = build_embedder(&config, &router).unwrap();
        assert!(!cell.is_initialized());
        assert_eq!(cell.dimensions(), 384);
        assert_eq!(cell.name(), "remote:text-embedding-3-small");
    }

    #[cfg(not(feature = "local"))]
    #[test]
    fn local_backend_requires_feature() {
        let mut config = AppConfig::default();
        config.embedding.backend = EmbeddingBackend::Local;
        let router = build_from_config(&config);
        assert!(build_embedder(&config, &router).is_err());
    }
}
