use std::time::Duration;
use ns_core::{ApiKey, Error, IngestConfig, QueryConfig, Result};
use ns_feeds::sources::{default_feeds, load_feeds_file, validate_feeds};
use ns_storage::{IndexBackend, IndexConfig};
use crate::Cli;

/// Everything the commands need, assembled and checked before any
/// network call is made.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ingest: IngestConfig,
    pub query: QueryConfig,
    pub index: IndexConfig,
    pub embedder: ns_inference::Config,
    pub fetch_timeout: Duration,
}

/// `--feed` and `--feeds-file` entries, or the built-in list when both
/// are absent.
pub fn resolve_feeds(cli: &Cli) -> Result<Vec<String>> {
    let mut feeds = cli.feeds.clone();
    if let Some(path) = &cli.feeds_file {
        feeds.extend(load_feeds_file(path)?);
    }
    if feeds.is_empty() {
        feeds = default_feeds();
    }
    validate_feeds(&feeds)?;
    Ok(feeds)
}

impl Settings {
    /// `env` looks up secrets so tests don't depend on the process environment.
    pub fn resolve(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        for (flag, value) in [
            ("--batch-size", cli.batch_size),
            ("--top-k", cli.top_k),
            ("--dimension", cli.dimension),
            ("--fetch-timeout", cli.fetch_timeout as usize),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", flag)));
            }
        }

        let feeds = resolve_feeds(cli)?;
        let secret = |key: &str| env(key).filter(|value| !value.trim().is_empty()).map(ApiKey::new);

        let index_key = match cli.index_backend {
            IndexBackend::Pinecone => Some(secret("PINECONE_API_KEY").ok_or_else(|| {
                Error::Config("PINECONE_API_KEY is not set".to_string())
            })?),
            IndexBackend::Qdrant => secret("QDRANT_API_KEY"),
            IndexBackend::Memory => None,
        };

        Ok(Self {
            ingest: IngestConfig {
                feeds,
                batch_size: cli.batch_size,
                threshold: cli.ingest_threshold,
            },
            query: QueryConfig {
                top_k: cli.top_k,
                ..QueryConfig::default()
            },
            index: IndexConfig {
                backend: cli.index_backend,
                name: cli.index_name.clone(),
                dimension: cli.dimension,
                api_key: index_key,
                url: cli.qdrant_url.clone(),
                cloud: cli.pinecone_cloud.clone(),
                region: cli.pinecone_region.clone(),
                ..IndexConfig::default()
            },
            embedder: ns_inference::Config {
                kind: cli.embedder,
                base_url: cli.embedding_url.clone(),
                model_name: cli.embedding_model.clone(),
                api_key: secret("EMBEDDING_API_KEY"),
                dimension: cli.dimension,
                ..ns_inference::Config::default()
            },
            fetch_timeout: Duration::from_secs(cli.fetch_timeout),
        })
    }
}
