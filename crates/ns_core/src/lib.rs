pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use config::{ApiKey, IngestConfig, QueryConfig, EMBEDDING_DIMENSION};
pub use error::Error;
pub use models::EmbeddingService;
pub use storage::VectorIndex;
pub use types::{article_id, Article, ArticleMetadata, IndexStats, ScoredMatch, VectorRecord};

pub type Result<T> = std::result::Result<T, Error>;
