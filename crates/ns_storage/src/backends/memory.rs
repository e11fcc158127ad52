use std::collections::HashMap;
use async_trait::async_trait;
use ns_core::{ArticleMetadata, Error, IndexStats, Result, ScoredMatch, VectorIndex, VectorRecord};
use tokio::sync::RwLock;

/// Index held in process memory. Used offline and as a test double;
/// ranking is a linear cosine scan.
pub struct InMemoryIndex {
    dimension: usize,
    records: RwLock<HashMap<String, (Vec<f32>, ArticleMetadata)>>,
}

impl InMemoryIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: RwLock::new(HashMap::new()),
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if let Some(bad) = records.iter().find(|r| r.values.len() != self.dimension) {
            return Err(Error::Index(format!(
                "Vector {} has {} dimensions, index expects {}",
                bad.id,
                bad.values.len(),
                self.dimension
            )));
        }

        let mut stored = self.records.write().await;
        for record in records {
            stored.insert(record.id.clone(), (record.values.clone(), record.metadata.clone()));
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        if vector.len() != self.dimension {
            return Err(Error::Index(format!(
                "Query vector has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            )));
        }

        let stored = self.records.read().await;
        let mut matches: Vec<ScoredMatch> = stored
            .iter()
            .map(|(id, (values, metadata))| ScoredMatch {
                id: id.clone(),
                score: cosine(vector, values),
                metadata: metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            total_count: self.records.read().await.len() as u64,
            dimension: Some(self.dimension),
        })
    }
}
