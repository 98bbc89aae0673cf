//! Configuration loading, validation, and management for salesrag.
//!
//! Loads configuration from `~/.salesrag/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.salesrag/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider used for completions and remote embeddings
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Completion model selection
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding backend
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector retrieval tuning and role filtering
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Guardrail limits
    #[serde(default)]
    pub guard: GuardConfig,

    /// Persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Text ingestion
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("llm", &self.llm)
            .field("embedding", &self.embedding)
            .field("retrieval", &self.retrieval)
            .field("guard", &self.guard)
            .field("storage", &self.storage)
            .field("ingest", &self.ingest)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model tried first
    #[serde(default = "default_primary_model")]
    pub primary_model: String,

    /// Smaller/faster model tried once when the primary fails
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional cap on generated tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-request HTTP timeout for completion and embedding calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_primary_model() -> String {
    "gpt-4o".into()
}
fn default_fallback_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            primary_model: default_primary_model(),
            fallback_model: default_fallback_model(),
            temperature: default_temperature(),
            max_tokens: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Which embedding backend to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/embeddings` endpoint of the default provider
    #[default]
    Remote,
    /// In-process sentence-transformer (requires the `local` feature)
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Remote model name or HuggingFace repo for the local backend
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected vector length. Every returned vector is checked against it.
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,

    /// Ask the remote backend to shorten vectors to `dimensions`. Backends
    /// that ignore the parameter (Ollama, most vLLM models) need this off,
    /// and `dimensions` must then equal the model's native size.
    #[serde(default = "default_true")]
    pub send_dimensions: bool,

    /// Re-normalize remote vectors to unit length
    #[serde(default = "default_true")]
    pub normalize: bool,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dimensions() -> usize {
    384
}
fn default_true() -> bool {
    true
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            send_dimensions: true,
            normalize: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Candidates requested from the vector store
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Hits must score at least this fraction of the best score
    #[serde(default = "default_relative_threshold")]
    pub relative_threshold: f32,

    /// A lead larger than this over the runner-up keeps only the top hit
    #[serde(default = "default_gap_margin")]
    pub gap_margin: f32,

    /// Net value separating sales-rep and risk-manager visibility
    #[serde(default = "default_high_value_threshold")]
    pub high_value_threshold: f64,
}

fn default_top_k() -> usize {
    5
}
fn default_relative_threshold() -> f32 {
    0.80
}
fn default_gap_margin() -> f32 {
    0.15
}
fn default_high_value_threshold() -> f64 {
    50_000.0
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            relative_threshold: default_relative_threshold(),
            gap_margin: default_gap_margin(),
            high_value_threshold: default_high_value_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Estimated context tokens above which synthesis is refused
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,
}

fn default_max_context_tokens() -> usize {
    3000
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
        }
    }
}

/// Which store implementation backs the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Ephemeral, process-local stores
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_database_url() -> String {
    format!(
        "sqlite://{}",
        AppConfig::config_dir().join("salesrag.db").display()
    )
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Text file loaded by `load-text`
    #[serde(default = "default_source_path")]
    pub source_path: String,

    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Source tag stored with every chunk; defaults to the file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,

    /// Also index every created sales order as a text document
    #[serde(default = "default_true")]
    pub embed_orders: bool,
}

fn default_source_path() -> String {
    "sales_context.txt".into()
}
fn default_chunk_size() -> usize {
    500
}

impl IngestConfig {
    /// The tag stored alongside each chunk.
    pub fn label(&self) -> String {
        self.source_label.clone().unwrap_or_else(|| {
            Path::new(&self.source_path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.source_path.clone())
        })
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            chunk_size: default_chunk_size(),
            source_label: None,
            embed_orders: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Per-client request budget per minute (0 disables limiting)
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: usize,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    4004
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_requests_per_minute() -> usize {
    60
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            requests_per_minute: default_requests_per_minute(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.salesrag/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file path, then apply environment
    /// overrides.
    ///
    /// - `SALESRAG_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `SALESRAG_PROVIDER`
    /// - `SALESRAG_PRIMARY_MODEL`, `SALESRAG_FALLBACK_MODEL`
    /// - `SALESRAG_DATABASE_URL`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("SALESRAG_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(provider) = std::env::var("SALESRAG_PROVIDER") {
            self.default_provider = provider;
        }
        if let Ok(model) = std::env::var("SALESRAG_PRIMARY_MODEL") {
            self.llm.primary_model = model;
        }
        if let Ok(model) = std::env::var("SALESRAG_FALLBACK_MODEL") {
            self.llm.fallback_model = model;
        }
        if let Ok(url) = std::env::var("SALESRAG_DATABASE_URL") {
            self.storage.database_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".salesrag")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llm.request_timeout_secs must be > 0".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }

        if !(self.retrieval.relative_threshold > 0.0 && self.retrieval.relative_threshold <= 1.0) {
            return Err(ConfigError::ValidationError(
                "retrieval.relative_threshold must be in (0.0, 1.0]".into(),
            ));
        }

        if self.retrieval.gap_margin < 0.0 {
            return Err(ConfigError::ValidationError(
                "retrieval.gap_margin must be >= 0".into(),
            ));
        }

        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_size must be > 0".into(),
            ));
        }

        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            guard: GuardConfig::default(),
            storage: StorageConfig::default(),
            ingest: IngestConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
