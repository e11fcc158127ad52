use std::sync::Arc;
use ns_core::{EmbeddingService, Error, Result};
use tracing::info;
use crate::{Config, ModelKind};

pub mod dummy;
pub mod http;
#[cfg(feature = "local")]
pub mod local;

pub use dummy::DummyModel;
pub use http::HttpEmbeddingModel;
#[cfg(feature = "local")]
pub use local::LocalModel;

pub async fn create_model(config: &Config) -> Result<Arc<dyn EmbeddingService>> {
    let model: Arc<dyn EmbeddingService> = match config.kind {
        ModelKind::Http => Arc::new(HttpEmbeddingModel::new(config)?),
        ModelKind::Dummy => Arc::new(DummyModel::new(config.dimension)),
        ModelKind::Local => create_local(config).await?,
    };
    info!("🧠 Embedding model ready: {} ({} dimensions)", model.name(), model.dimension());
    Ok(model)
}

#[cfg(feature = "local")]
async fn create_local(config: &Config) -> Result<Arc<dyn EmbeddingService>> {
    Ok(Arc::new(LocalModel::new(config.dimension).await?))
}

#[cfg(not(feature = "local"))]
async fn create_local(_config: &Config) -> Result<Arc<dyn EmbeddingService>> {
    Err(Error::Config(
        "The local embedder is not compiled in, rebuild with `--features local`".to_string(),
    ))
}
