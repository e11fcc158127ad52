use std::fmt;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use ns_core::{ApiKey, EmbeddingService, Error, Result};
use crate::Config;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Client for any server speaking the OpenAI `/embeddings` protocol
/// (text-embeddings-inference, Ollama, vLLM, OpenAI itself).
pub struct HttpEmbeddingModel {
    client: Client,
    api_key: Option<ApiKey>,
    base_url: String,
    model_name: String,
    dimension: usize,
}

impl HttpEmbeddingModel {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_name: config.model_name.clone(),
            dimension: config.dimension,
        })
    }
}

impl fmt::Debug for HttpEmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEmbeddingModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .finish()
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.generate_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| Error::Embedding("Empty response from embedding service".to_string()))
    }

    async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            input: texts,
            model: &self.model_name,
        };

        let mut builder = self.client
            .post(format!("{}/embeddings", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request to {} failed: {}", self.base_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("HTTP {}: {}", status, body)));
        }

        let mut response = response
            .json::<EmbeddingResponse>()
            .await
            .map_err(|e| Error::Embedding(format!("Malformed embedding response: {}", e)))?;

        if response.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Asked for {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|item| item.index);
        response
            .data
            .into_iter()
            .map(|item| {
                if item.embedding.len() == self.dimension {
                    Ok(item.embedding)
                } else {
                    Err(Error::Embedding(format!(
                        "{} returned {} dimensions, expected {}",
                        self.model_name,
                        item.embedding.len(),
                        self.dimension
                    )))
                }
            })
            .collect()
    }
}
