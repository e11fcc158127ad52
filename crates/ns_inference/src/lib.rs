use std::time::Duration;
use ns_core::{ApiKey, EMBEDDING_DIMENSION};

pub mod models;

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:8080/v1";
pub const DEFAULT_MODEL_NAME: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelKind {
    /// OpenAI-compatible `/embeddings` endpoint
    Http,
    /// Deterministic hashed bag of words, no network
    Dummy,
    /// In-process ONNX model (needs the `local` feature)
    Local,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub kind: ModelKind,
    pub base_url: String,
    pub model_name: String,
    pub api_key: Option<ApiKey>,
    pub dimension: usize,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: ModelKind::Http,
            base_url: DEFAULT_EMBEDDING_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            api_key: None,
            dimension: EMBEDDING_DIMENSION,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub mod prelude {
    pub use super::{Config, ModelKind};
    pub use super::models::create_model;
    pub use ns_core::{EmbeddingService, Error, Result};
}

pub use models::create_model;
