use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use ns_core::{ArticleMetadata, Error, IndexStats, Result, ScoredMatch, VectorIndex, VectorRecord};
use qdrant_client::{
    Qdrant, QdrantError,
    qdrant::{
        point_id::PointIdOptions, vectors_config::Config, CreateCollection, Distance,
        GetCollectionInfoRequest, PointId, PointStruct, SearchPoints, UpsertPoints, Value,
        VectorParams, Vectors, VectorsConfig, WithPayloadSelector,
    },
};
use tracing::info;
use uuid::Uuid;
use crate::{IndexConfig, DEFAULT_QDRANT_URL};

/// Payload key holding the article id; Qdrant point ids must be UUIDs.
const ARTICLE_ID_KEY: &str = "article_id";

pub struct QdrantIndex {
    client: Arc<Qdrant>,
    collection_name: String,
    dimension: usize,
}

fn index_error(e: QdrantError) -> Error {
    Error::Index(e.to_string())
}

impl QdrantIndex {
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        let url = config.url.as_deref().unwrap_or(DEFAULT_QDRANT_URL);
        let client = Qdrant::from_url(url)
            .api_key(config.api_key.as_ref().map(|key| key.expose().to_string()))
            .build()
            .map_err(|e| Error::Config(format!("Invalid Qdrant configuration: {}", e)))?;
        let client = Arc::new(client);

        let collections = client.list_collections().await.map_err(index_error)?;
        if !collections.collections.iter().any(|c| c.name == config.name) {
            info!("🆕 Creating collection '{}' ({} dimensions, cosine)", config.name, config.dimension);
            let vectors_config = VectorsConfig {
                config: Some(Config::Params(VectorParams {
                    size: config.dimension as u64,
                    distance: Distance::Cosine.into(),
                    ..Default::default()
                })),
            };

            client
                .create_collection(CreateCollection {
                    collection_name: config.name.clone(),
                    vectors_config: Some(vectors_config),
                    ..Default::default()
                })
                .await
                .map_err(index_error)?;
        }

        let index = Self {
            client,
            collection_name: config.name.clone(),
            dimension: config.dimension,
        };

        if let Some(existing) = index.describe_stats().await?.dimension {
            if existing != config.dimension {
                return Err(Error::Config(format!(
                    "Collection '{}' has dimension {}, the embedder produces {}",
                    config.name, existing, config.dimension
                )));
            }
        }

        Ok(index)
    }
}

/// Article ids are 32 hex characters, which parse as a simple-format UUID.
fn point_id(article_id: &str) -> Result<PointId> {
    let uuid = Uuid::parse_str(article_id)
        .map_err(|e| Error::Index(format!("Id {} is not a valid point id: {}", article_id, e)))?;
    Ok(uuid.to_string().into())
}

fn payload(record: &VectorRecord) -> HashMap<String, Value> {
    let metadata = &record.metadata;
    let mut payload = HashMap::new();
    payload.insert(ARTICLE_ID_KEY.to_string(), record.id.clone().into());
    for (key, value) in [
        ("title", &metadata.title),
        ("summary", &metadata.summary),
        ("published_at", &metadata.published_at),
        ("source", &metadata.source),
        ("category", &metadata.category),
    ] {
        if let Some(value) = value {
            payload.insert(key.to_string(), value.clone().into());
        }
    }
    payload
}

fn metadata(payload: &HashMap<String, Value>) -> ArticleMetadata {
    let field = |key: &str| payload.get(key).and_then(|v| v.as_str()).map(|s| s.to_string());
    ArticleMetadata {
        title: field("title"),
        summary: field("summary"),
        published_at: field("published_at"),
        source: field("source"),
        category: field("category"),
    }
}

fn match_id(id: Option<PointId>, payload: &HashMap<String, Value>) -> String {
    if let Some(article_id) = payload.get(ARTICLE_ID_KEY).and_then(|v| v.as_str()) {
        return article_id.to_string();
    }
    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points = records
            .iter()
            .map(|record| {
                Ok(PointStruct {
                    id: Some(point_id(&record.id)?),
                    vectors: Some(Vectors::from(record.values.clone())),
                    payload: payload(record),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPoints {
                collection_name: self.collection_name.clone(),
                wait: Some(true),
                points,
                ..Default::default()
            })
            .await
            .map_err(index_error)?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        let search_request = SearchPoints {
            collection_name: self.collection_name.clone(),
            vector: vector.to_vec(),
            limit: top_k as u64,
            with_payload: Some(WithPayloadSelector::from(true)),
            ..Default::default()
        };

        let results = self.client.search_points(search_request).await.map_err(index_error)?;

        Ok(results
            .result
            .into_iter()
            .map(|point| ScoredMatch {
                metadata: metadata(&point.payload),
                id: match_id(point.id, &point.payload),
                score: point.score,
            })
            .collect())
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        let info = self
            .client
            .collection_info(GetCollectionInfoRequest {
                collection_name: self.collection_name.clone(),
            })
            .await
            .map_err(index_error)?
            .result
            .ok_or_else(|| Error::Index(format!("No info for collection '{}'", self.collection_name)))?;

        let dimension = info
            .config
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                Config::Params(params) => Some(params.size as usize),
                _ => None,
            });

        Ok(IndexStats {
            total_count: info.points_count.unwrap_or_default(),
            dimension: dimension.or(Some(self.dimension)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::article_id;

    #[test]
    fn test_article_id_is_a_valid_point_id() {
        let id = article_id("dennikn.sk", "Titulok");
        assert!(point_id(&id).is_ok());
        assert!(point_id("not-hex").is_err());
    }

    #[test]
    fn test_payload_roundtrips_metadata() {
        let record = VectorRecord {
            id: article_id("dennikn.sk", "Titulok"),
            values: vec![0.1; 4],
            metadata: ArticleMetadata {
                title: Some("Titulok".to_string()),
                source: Some("dennikn.sk".to_string()),
                ..Default::default()
            },
        };
        let payload = payload(&record);
        assert_eq!(metadata(&payload), record.metadata);
        assert_eq!(match_id(None, &payload), record.id);
    }
}
