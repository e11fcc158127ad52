use std::sync::Arc;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use ns_core::{EmbeddingService, Error, Result};
use tracing::info;

const LOCAL_MODEL_NAME: &str = "paraphrase-multilingual-MiniLM-L12-v2";
const LOCAL_MODEL_DIMENSION: usize = 384;

/// Multilingual MiniLM run in-process through ONNX runtime.
/// The weights are downloaded on first use.
#[derive(Clone)]
pub struct LocalModel {
    model: Arc<TextEmbedding>,
}

impl LocalModel {
    pub async fn new(dimension: usize) -> Result<Self> {
        if dimension != LOCAL_MODEL_DIMENSION {
            return Err(Error::Config(format!(
                "{} produces {} dimensions, configured {}",
                LOCAL_MODEL_NAME, LOCAL_MODEL_DIMENSION, dimension
            )));
        }

        info!("📥 Loading {}", LOCAL_MODEL_NAME);
        let model = tokio::task::spawn_blocking(|| {
            TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::ParaphraseMLMiniLML12V2)
                    .with_show_download_progress(true),
            )
        })
        .await
        .map_err(|e| Error::Embedding(format!("Model loading task failed: {}", e)))?
        .map_err(|e| Error::Embedding(format!("Failed to load {}: {}", LOCAL_MODEL_NAME, e)))?;

        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl EmbeddingService for LocalModel {
    fn name(&self) -> &str {
        LOCAL_MODEL_NAME
    }

    fn dimension(&self) -> usize {
        LOCAL_MODEL_DIMENSION
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))
    }

    async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.model.clone();
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            model
                .embed(texts, None)
                .map_err(|e| Error::Embedding(format!("Batch embedding error: {}", e)))
        })
        .await
        .map_err(|e| Error::Embedding(format!("Embedding task join error: {}", e)))?
    }
}
