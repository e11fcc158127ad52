use async_trait::async_trait;
use crate::types::{IndexStats, ScoredMatch, VectorRecord};
use crate::Result;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    /// Insert or overwrite records keyed by id. Last write wins.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Nearest neighbours by cosine similarity, best first, with metadata
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>>;

    /// Record count and dimension of the index
    async fn describe_stats(&self) -> Result<IndexStats>;
}
