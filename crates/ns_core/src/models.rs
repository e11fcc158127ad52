use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Human readable name used in logs
    fn name(&self) -> &str;

    /// Length of every vector this service returns
    fn dimension(&self) -> usize;

    /// Generate an embedding for a piece of text
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for several texts, in input order
    async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.generate_embeddings(text).await?);
        }
        Ok(embeddings)
    }
}
