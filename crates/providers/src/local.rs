//! Local embedding backend: runs a sentence-transformer on your hardware.
//!
//! Uses [Candle](https://github.com/huggingface/candle) to run a BERT-family
//! model (default `sentence-transformers/all-MiniLM-L6-v2`, 384 dimensions)
//! with mean pooling and L2 normalization. Weights are fetched once through
//! the HuggingFace Hub cache.
//!
//! Loading is blocking and slow; wrap the constructor in an
//! [`EmbedderCell`](crate::embedder::EmbedderCell) so it runs once.

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::Api;
use salesrag_core::embedding::{Embedder, EmbeddingVector, l2_normalize};
use salesrag_core::error::ProviderError;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Default HuggingFace repository for the local backend.
pub const DEFAULT_LOCAL_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// A sentence-transformer loaded into memory.
pub struct LocalEmbedder {
    name: String,
    dimensions: usize,
    state: Arc<LocalModelState>,
}

struct LocalModelState {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// The only config field we read ourselves; the rest goes to Candle.
#[derive(Deserialize)]
struct HiddenSize {
    hidden_size: usize,
}

impl LocalEmbedder {
    /// Download (if needed) and load `repo_id`. Blocking.
    pub fn load(repo_id: &str) -> Result<Self, ProviderError> {
        info!(model = repo_id, "Downloading/loading local embedding model");

        let api = Api::new().map_err(|e| {
            ProviderError::Network(format!("Failed to initialize HuggingFace Hub API: {e}"))
        })?;
        let repo = api.model(repo_id.to_string());

        let fetch = |file: &str| -> Result<PathBuf, ProviderError> {
            repo.get(file).map_err(|e| {
                ProviderError::Network(format!("Failed to download '{file}' from '{repo_id}': {e}"))
            })
        };

        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_text = std::fs::read_to_string(&config_path)
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to read model config: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_text)
            .map_err(|e| ProviderError::NotConfigured(format!("Invalid model config: {e}")))?;
        let HiddenSize { hidden_size } = serde_json::from_str(&config_text)
            .map_err(|e| ProviderError::NotConfigured(format!("Invalid model config: {e}")))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to load tokenizer: {e}")))?;

        let device = Device::Cpu;
        let weights = std::fs::read(&weights_path)
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to read weights: {e}")))?;
        let vb = VarBuilder::from_buffered_safetensors(weights, DType::F32, &device)
            .map_err(map_candle_err)?;
        let model = BertModel::load(vb, &config).map_err(map_candle_err)?;

        info!(model = repo_id, dimensions = hidden_size, "Local embedding model loaded");

        Ok(Self {
            name: format!("local:{repo_id}"),
            dimensions: hidden_size,
            state: Arc::new(LocalModelState {
                model,
                tokenizer,
                device,
            }),
        })
    }
}

impl LocalModelState {
    /// Tokenize → forward → mean-pool → normalize.
    fn embed_blocking(&self, text: &str) -> Result<EmbeddingVector, ProviderError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ProviderError::ApiError {
                status_code: 500,
                message: format!("Tokenization failed: {e}"),
            })?;

        let ids = encoding.get_ids();
        let token_count = ids.len();

        let input_ids = Tensor::new(ids, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(map_candle_err)?;
        let token_type_ids = input_ids.zeros_like().map_err(map_candle_err)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(map_candle_err)?;

        // (1, tokens, hidden)
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(map_candle_err)?;

        let pooled = hidden
            .sum(1)
            .and_then(|t| t.affine(1.0 / token_count.max(1) as f64, 0.0))
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(map_candle_err)?;

        let mut vector = pooled;
        l2_normalize(&mut vector);

        debug!(tokens = token_count, "Local embedding computed");
        Ok(vector)
    }
}

fn map_candle_err(e: candle_core::Error) -> ProviderError {
    ProviderError::ApiError {
        status_code: 500,
        message: format!("Candle inference error: {e}"),
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError> {
        let state = self.state.clone();
        let text = text.to_string();

        // Candle is CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || state.embed_blocking(&text))
            .await
            .map_err(|e| ProviderError::ApiError {
                status_code: 500,
                message: format!("Embedding task panicked: {e}"),
            })?
    }
}
