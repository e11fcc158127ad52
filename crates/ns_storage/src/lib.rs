use std::sync::Arc;
use std::time::Duration;
use ns_core::{ApiKey, Error, Result, VectorIndex, EMBEDDING_DIMENSION};
use tracing::info;

pub mod backends;

pub use backends::*;

pub const DEFAULT_INDEX_NAME: &str = "slovenske-spravy";
pub const DEFAULT_CLOUD: &str = "aws";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const PINECONE_CONTROL_PLANE: &str = "https://api.pinecone.io";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IndexBackend {
    /// Managed Pinecone serverless index
    Pinecone,
    /// Process-local index, lost on exit
    Memory,
    /// Qdrant collection (needs the `qdrant` feature)
    Qdrant,
}

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub backend: IndexBackend,
    pub name: String,
    pub dimension: usize,
    pub api_key: Option<ApiKey>,
    /// Qdrant endpoint; ignored by the other backends.
    pub url: Option<String>,
    pub cloud: String,
    pub region: String,
    pub control_plane_url: String,
    /// How long to wait for a freshly created index to become ready.
    pub ready_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::Pinecone,
            name: DEFAULT_INDEX_NAME.to_string(),
            dimension: EMBEDDING_DIMENSION,
            api_key: None,
            url: None,
            cloud: DEFAULT_CLOUD.to_string(),
            region: DEFAULT_REGION.to_string(),
            control_plane_url: PINECONE_CONTROL_PLANE.to_string(),
            ready_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Connect to the configured backend, creating the index when it does
/// not exist yet.
pub async fn create_index(config: &IndexConfig) -> Result<Arc<dyn VectorIndex>> {
    let index: Arc<dyn VectorIndex> = match config.backend {
        IndexBackend::Pinecone => Arc::new(PineconeIndex::connect(config).await?),
        IndexBackend::Memory => Arc::new(InMemoryIndex::new(config.dimension)),
        IndexBackend::Qdrant => connect_qdrant(config).await?,
    };
    info!("🗄️ Using {} index '{}'", index.name(), config.name);
    Ok(index)
}

#[cfg(feature = "qdrant")]
async fn connect_qdrant(config: &IndexConfig) -> Result<Arc<dyn VectorIndex>> {
    Ok(Arc::new(QdrantIndex::connect(config).await?))
}

#[cfg(not(feature = "qdrant"))]
async fn connect_qdrant(_config: &IndexConfig) -> Result<Arc<dyn VectorIndex>> {
    Err(Error::Config(
        "Qdrant support is not compiled in, rebuild with `--features qdrant`".to_string(),
    ))
}

pub mod prelude {
    pub use super::{create_index, IndexBackend, IndexConfig};
    pub use super::backends::*;
    pub use ns_core::{VectorIndex, Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::{ArticleMetadata, VectorRecord};

    #[tokio::test]
    async fn test_create_memory_index() {
        let config = IndexConfig {
            backend: IndexBackend::Memory,
            dimension: 2,
            ..IndexConfig::default()
        };
        let index = create_index(&config).await.unwrap();
        index
            .upsert(&[VectorRecord {
                id: "a".to_string(),
                values: vec![1.0, 0.0],
                metadata: ArticleMetadata::default(),
            }])
            .await
            .unwrap();
        assert_eq!(index.describe_stats().await.unwrap().total_count, 1);
    }

    #[tokio::test]
    async fn test_pinecone_requires_api_key() {
        let err = create_index(&IndexConfig::default()).await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(not(feature = "qdrant"))]
    #[tokio::test]
    async fn test_qdrant_requires_feature() {
        let config = IndexConfig {
            backend: IndexBackend::Qdrant,
            ..IndexConfig::default()
        };
        let err = create_index(&config).await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
