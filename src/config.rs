//! TOML configuration.
//!
//! Every section is optional; a missing key falls back to the defaults of
//! the hosted endpoint the tool was built against. API keys are never read
//! from the file, only from the environment variable named by
//! `api_key_env`.

use anyhow::{bail, Context, Result};
use docqa_core::answer::DEFAULT_SYSTEM_PROMPT;
use docqa_core::chunk::{ChunkingParams, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use docqa_core::{ContextBudget, DistanceMetric, PipelineOptions};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "./config/docqa.toml";
pub const DEFAULT_BASE_URL: &str = "https://llm.nrp-nautilus.io";
pub const DEFAULT_API_KEY_ENV: &str = "LITELLM_KEY";
pub const DEFAULT_EMBEDDING_MODEL: &str = "embed-mistral";
pub const DEFAULT_DOCUMENT_URL: &str = "https://your.kingcounty.gov/dnrp/library/water-and-land/science/seminars/November-2004/Mapping-Geology-of-Greater-Seattle-Area-Infiltration-Peat-Bogs-and-Volcanic-Ash.pdf";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    /// Request server-sent-event streaming and assemble the deltas.
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            timeout_secs: default_llm_timeout_secs(),
            stream: false,
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_llm_model() -> String {
    "llama3".to_string()
}
fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}
fn default_llm_timeout_secs() -> u64 {
    120
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `openai`, `ollama`, `local`, or `disabled`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Unset means the provider's default model.
    #[serde(default)]
    pub model: Option<String>,
    /// Output dimension of `model`. Required for `openai` and `ollama`;
    /// `local` falls back to the model's known dimension.
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: None,
            dims: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// Model for the remote providers.
    pub fn remote_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string())
    }

    /// `dims` for providers that cannot infer it.
    pub fn required_dims(&self) -> Result<usize> {
        match self.dims {
            Some(dims) if dims > 0 => Ok(dims),
            _ => bail!(
                "embedding.dims required for provider '{}'",
                self.provider
            ),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

impl ChunkingConfig {
    pub fn params(&self) -> Result<ChunkingParams> {
        Ok(ChunkingParams::new(self.chunk_size, self.overlap)?)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default = "default_build_concurrency")]
    pub build_concurrency: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            metric: default_metric(),
            max_context_chars: default_max_context_chars(),
            build_concurrency: default_build_concurrency(),
        }
    }
}

fn default_top_k() -> usize {
    4
}
fn default_metric() -> String {
    "cosine".to_string()
}
fn default_max_context_chars() -> usize {
    12_000
}
fn default_build_concurrency() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_loader_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_document_url")]
    pub default_url: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_loader_timeout_secs(),
            max_bytes: default_max_bytes(),
            default_url: default_document_url(),
        }
    }
}

fn default_loader_timeout_secs() -> u64 {
    60
}
fn default_max_bytes() -> u64 {
    50 * 1024 * 1024
}
fn default_document_url() -> String {
    DEFAULT_DOCUMENT_URL.to_string()
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Retrieval and generation settings for [`docqa_core::QaPipeline`].
    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        let metric: DistanceMetric = self
            .retrieval
            .metric
            .parse()
            .map_err(anyhow::Error::msg)?;
        Ok(PipelineOptions {
            top_k: self.retrieval.top_k,
            metric,
            budget: ContextBudget {
                max_chars: self.retrieval.max_context_chars,
            },
            system_prompt: self.llm.system_prompt.clone(),
            build_concurrency: self.retrieval.build_concurrency,
        })
    }
}

/// Read the API key named by `var`, if set and non-empty.
pub fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|k| !k.is_empty())
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Load an explicitly given `path`, which must exist. Without one, load
/// [`DEFAULT_CONFIG_PATH`] if present, otherwise use [`Config::minimal`].
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return load_config(path);
    }
    let default = Path::new(DEFAULT_CONFIG_PATH);
    if default.exists() {
        load_config(default)
    } else {
        tracing::debug!(path = %default.display(), "no config file, using defaults");
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.overlap >= config.chunking.chunk_size {
        bail!(
            "chunking.overlap ({}) must be less than chunking.chunk_size ({})",
            config.chunking.overlap,
            config.chunking.chunk_size
        );
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.max_context_chars < 1 {
        bail!("retrieval.max_context_chars must be >= 1");
    }
    if config.retrieval.build_concurrency < 1 {
        bail!("retrieval.build_concurrency must be >= 1");
    }
    config
        .retrieval
        .metric
        .parse::<DistanceMetric>()
        .map_err(anyhow::Error::msg)
        .context("Invalid retrieval.metric")?;

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }
    match config.embedding.provider.as_str() {
        "openai" | "ollama" => {
            if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        "local" if config.embedding.dims == Some(0) => {
            bail!("embedding.dims must be > 0 when provider is 'local'");
        }
        _ => {}
    }

    if config.llm.model.is_empty() {
        bail!("llm.model must not be empty");
    }

    Ok(())
}
