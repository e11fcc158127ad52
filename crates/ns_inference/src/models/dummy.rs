use std::fmt;
use async_trait::async_trait;
use ns_core::{EmbeddingService, Result};
use sha2::{Digest, Sha256};

/// Offline embedder: lowercase word tokens hashed into buckets, then
/// L2-normalised. Texts sharing words land close together, which is
/// enough for demos and tests.
///
/// Buckets come from SHA-256, so vectors stay the same across builds and
/// can be written to a persistent index.
pub struct DummyModel {
    dimension: usize,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel")
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl DummyModel {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.to_lowercase().as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dimension as u64) as usize
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            embedding[self.bucket(token)] += 1.0;
        }

        let norm = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingService for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new(384);

        let embedding = model.generate_embeddings("Test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
        assert!((dot(&embedding, &embedding) - 1.0).abs() < 1e-5);

        let again = model.generate_embeddings("Test text").await.unwrap();
        assert_eq!(embedding, again);
    }

    #[tokio::test]
    async fn test_shared_words_score_higher() {
        let model = DummyModel::new(384);
        let query = model.generate_embeddings("hokej majstrovstvá sveta").await.unwrap();
        let related = model.generate_embeddings("Slovensko na majstrovstvá sveta v hokej").await.unwrap();
        let unrelated = model.generate_embeddings("Inflácia a ceny potravín").await.unwrap();
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_case_insensitive() {
        let model = DummyModel::new(64);
        let lower = model.generate_embeddings("bratislava").await.unwrap();
        let upper = model.generate_embeddings("BRATISLAVA").await.unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_buckets_are_fixed() {
        assert_eq!(DummyModel::new(64).bucket("bratislava"), 23);
        assert_eq!(DummyModel::new(384).bucket("Bratislava"), 279);
        assert_eq!(DummyModel::new(384).bucket("hokej"), 159);
    }

    #[tokio::test]
    async fn test_single_token_lands_in_its_bucket() {
        let embedding = DummyModel::new(64).generate_embeddings("Bratislava").await.unwrap();
        assert_eq!(embedding[23], 1.0);
        assert_eq!(embedding.iter().filter(|v| **v != 0.0).count(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let model = DummyModel::new(16);
        let embedding = model.generate_embeddings("").await.unwrap();
        assert!(embedding.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_generate_batch_keeps_order() {
        let model = DummyModel::new(32);
        let texts = vec!["prvý".to_string(), "druhý".to_string()];
        let batch = model.generate_batch(&texts).await.unwrap();
        assert_eq!(batch[0], model.generate_embeddings("prvý").await.unwrap());
        assert_eq!(batch[1], model.generate_embeddings("druhý").await.unwrap());
    }
}
