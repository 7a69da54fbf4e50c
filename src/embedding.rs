//! Embedding providers.
//!
//! Concrete [`Embedder`] implementations selected by `embedding.provider`:
//! - **[`DisabledEmbedder`]**: every call fails; for `inspect`-only setups.
//! - **[`OpenAiEmbedder`]**: `POST {base_url}/embeddings` on any
//!   OpenAI-compatible endpoint (the hosted LiteLLM proxy by default).
//! - **[`OllamaEmbedder`]**: `POST {base_url}/api/embed` on a local Ollama.
//! - **`LocalEmbedder`**: in-process fastembed, behind the
//!   `local-embeddings` feature.
//!
//! One text per call. Failures are reported once as [`EmbeddingError`];
//! nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use docqa_core::{Embedder, EmbeddingError};
use tracing::debug;

use crate::config::{api_key_from_env, EmbeddingConfig};

// ============ Disabled ============

pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::new(
            "disabled",
            "embedding provider is disabled",
        ))
    }
}

// ============ OpenAI-compatible ============

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dims: usize,
    api_key: String,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.remote_model(),
            dims: config.required_dims()?,
            api_key,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::new("openai", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::new(
                "openai",
                format!("API error {status}: {body_text}"),
            ));
        }
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::new("openai", e.to_string()))?;
        let vector = parse_openai_response(&json).map_err(|m| EmbeddingError::new("openai", m))?;
        debug!(model = %self.model, dims = vector.len(), "embedded text");
        Ok(vector)
    }
}

/// Extract `data[0].embedding` from an embeddings response.
pub fn parse_openai_response(json: &serde_json::Value) -> std::result::Result<Vec<f32>, String> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| "invalid response: missing data[0].embedding".to_string())?;
    to_f32_vec(embedding)
}

// ============ Ollama ============

pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dims: usize,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.base_url.trim_end_matches('/').to_string(),
            model: config.remote_model(),
            dims: config.required_dims()?,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });
        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                EmbeddingError::new(
                    "ollama",
                    format!("connection error (is Ollama running at {}?): {e}", self.url),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::new(
                "ollama",
                format!("API error {status}: {body_text}"),
            ));
        }
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::new("ollama", e.to_string()))?;
        parse_ollama_response(&json).map_err(|m| EmbeddingError::new("ollama", m))
    }
}

/// Extract `embeddings[0]` from an Ollama `/api/embed` response.
pub fn parse_ollama_response(json: &serde_json::Value) -> std::result::Result<Vec<f32>, String> {
    let embedding = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .and_then(|e| e.first())
        .and_then(|e| e.as_array())
        .ok_or_else(|| "invalid response: missing embeddings[0]".to_string())?;
    to_f32_vec(embedding)
}

fn to_f32_vec(values: &[serde_json::Value]) -> std::result::Result<Vec<f32>, String> {
    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| format!("invalid response: non-numeric component {v}"))
        })
        .collect()
}

// ============ Local (fastembed) ============

#[cfg(feature = "local-embeddings")]
pub struct LocalEmbedder {
    model_name: String,
    dims: usize,
    model: Arc<std::sync::Mutex<fastembed::TextEmbedding>>,
}

#[cfg(feature = "local-embeddings")]
impl LocalEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_name = config
            .model
            .clone()
            .unwrap_or_else(|| "all-minilm-l6-v2".to_string());
        let (fastembed_model, default_dims) = fastembed_model(&model_name)?;
        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(fastembed_model).with_show_download_progress(true),
        )
        .map_err(|e| anyhow::anyhow!("Failed to initialize local embedding model: {}", e))?;
        Ok(Self {
            model_name,
            dims: config.dims.unwrap_or(default_dims),
            model: Arc::new(std::sync::Mutex::new(model)),
        })
    }
}

#[cfg(feature = "local-embeddings")]
fn fastembed_model(name: &str) -> Result<(fastembed::EmbeddingModel, usize)> {
    use fastembed::EmbeddingModel;
    match name {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        "bge-large-en-v1.5" => Ok((EmbeddingModel::BGELargeENV15, 1024)),
        "nomic-embed-text-v1.5" => Ok((EmbeddingModel::NomicEmbedTextV15, 768)),
        other => bail!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, \
             nomic-embed-text-v1.5",
            other
        ),
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();
        let result = tokio::task::spawn_blocking(move || {
            let mut model = model.lock().map_err(|e| e.to_string())?;
            model
                .embed(vec![text], None)
                .map_err(|e| e.to_string())?
                .into_iter()
                .next()
                .ok_or_else(|| "empty embedding result".to_string())
        })
        .await
        .map_err(|e| EmbeddingError::new("local", e.to_string()))?;
        result.map_err(|m| EmbeddingError::new("local", m))
    }
}

/// Create the [`Embedder`] named by `config.provider`.
///
/// | Config Value | Embedder |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAiEmbedder`] (needs the key in `api_key_env`) |
/// | `"ollama"` | [`OllamaEmbedder`] |
/// | `"local"` | `LocalEmbedder` (`local-embeddings` feature) |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        "openai" => {
            let Some(key) = api_key_from_env(&config.api_key_env) else {
                bail!("{} environment variable not set", config.api_key_env);
            };
            Ok(Arc::new(OpenAiEmbedder::new(config, key)?))
        }
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config)?)),
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Arc::new(LocalEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => bail!("Local embedding provider requires --features local-embeddings"),
        other => bail!("Unknown embedding provider: {}", other),
    }
}
