use std::fmt;
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use ns_core::{ArticleMetadata, Error, IndexStats, Result, ScoredMatch, VectorIndex, VectorRecord};
use tracing::{debug, info};
use url::Url;
use crate::IndexConfig;

const API_VERSION: &str = "2024-07";

#[derive(Debug, Deserialize)]
struct IndexDescription {
    dimension: usize,
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a ArticleMetadata,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<ArticleMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    total_vector_count: u64,
}

/// Pinecone serverless index spoken to over its REST API.
pub struct PineconeIndex {
    client: Client,
    host: Url,
    name: String,
}

impl fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("host", &self.host.as_str())
            .field("name", &self.name)
            .finish()
    }
}

impl PineconeIndex {
    /// Resolve the index host through the control plane, creating and
    /// waiting for the index when it does not exist.
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        let api_key = config.api_key.as_ref().ok_or_else(|| {
            Error::Config("PINECONE_API_KEY is required for the pinecone backend".to_string())
        })?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "Api-Key",
            header::HeaderValue::from_str(api_key.expose())
                .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
        );
        headers.insert("X-Pinecone-API-Version", header::HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let control_plane = config.control_plane_url.trim_end_matches('/');
        let description = match describe_index(&client, control_plane, &config.name).await? {
            Some(description) => description,
            None => {
                info!("🆕 Creating index '{}' ({} dimensions, cosine)", config.name, config.dimension);
                create_index(&client, control_plane, config).await?
            }
        };

        let description = if description.status.ready {
            description
        } else {
            tokio::time::timeout(
                config.ready_timeout,
                wait_until_ready(&client, control_plane, config),
            )
            .await
            .map_err(|_| {
                Error::Index(format!(
                    "Index '{}' not ready after {:?}",
                    config.name, config.ready_timeout
                ))
            })??
        };

        if description.dimension != config.dimension {
            return Err(Error::Config(format!(
                "Index '{}' has dimension {}, the embedder produces {}",
                config.name, description.dimension, config.dimension
            )));
        }

        Ok(Self {
            client,
            host: data_plane_url(&description.host)?,
            name: config.name.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.host
            .join(path)
            .map_err(|e| Error::Index(format!("Bad endpoint {}: {}", path, e)))
    }
}

fn data_plane_url(host: &str) -> Result<Url> {
    if host.is_empty() {
        return Err(Error::Index("Control plane returned no index host".to_string()));
    }
    let base = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    Url::parse(&base).map_err(|e| Error::Index(format!("Invalid index host {}: {}", host, e)))
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(Error::Config(format!("Pinecone rejected the API key: {}", body)))
        }
        _ => Err(Error::Index(format!("HTTP {}: {}", status, body))),
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::Index(format!("Request failed: {}", e))
}

async fn describe_index(client: &Client, control_plane: &str, name: &str) -> Result<Option<IndexDescription>> {
    let response = client
        .get(format!("{}/indexes/{}", control_plane, name))
        .send()
        .await
        .map_err(transport)?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let description = check(response)
        .await?
        .json::<IndexDescription>()
        .await
        .map_err(transport)?;
    Ok(Some(description))
}

async fn create_index(client: &Client, control_plane: &str, config: &IndexConfig) -> Result<IndexDescription> {
    let body = json!({
        "name": config.name,
        "dimension": config.dimension,
        "metric": "cosine",
        "spec": {
            "serverless": {
                "cloud": config.cloud,
                "region": config.region,
            }
        }
    });

    let response = client
        .post(format!("{}/indexes", control_plane))
        .json(&body)
        .send()
        .await
        .map_err(transport)?;

    // Someone else created it between our describe and create.
    if response.status() == StatusCode::CONFLICT {
        return describe_index(client, control_plane, &config.name)
            .await?
            .ok_or_else(|| Error::Index(format!("Index '{}' vanished after creation", config.name)));
    }

    check(response)
        .await?
        .json::<IndexDescription>()
        .await
        .map_err(transport)
}

async fn wait_until_ready(client: &Client, control_plane: &str, config: &IndexConfig) -> Result<IndexDescription> {
    loop {
        if let Some(description) = describe_index(client, control_plane, &config.name).await? {
            if description.status.ready {
                return Ok(description);
            }
            debug!("Index '{}' is {}, waiting", config.name, description.status.state);
        }
        tokio::time::sleep(config.poll_interval).await;
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let vectors: Vec<UpsertVector> = records
            .iter()
            .map(|record| UpsertVector {
                id: &record.id,
                values: &record.values,
                metadata: &record.metadata,
            })
            .collect();

        let response = self
            .client
            .post(self.endpoint("vectors/upsert")?)
            .json(&json!({ "vectors": vectors }))
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        let response = self
            .client
            .post(self.endpoint("query")?)
            .json(&json!({
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true,
                "includeValues": false,
            }))
            .send()
            .await
            .map_err(transport)?;

        let response = check(response)
            .await?
            .json::<QueryResponse>()
            .await
            .map_err(transport)?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| ScoredMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        let response = self
            .client
            .post(self.endpoint("describe_index_stats")?)
            .json(&json!({}))
            .send()
            .await
            .map_err(transport)?;

        let stats = check(response)
            .await?
            .json::<StatsResponse>()
            .await
            .map_err(transport)?;

        Ok(IndexStats {
            total_count: stats.total_vector_count,
            dimension: stats.dimension,
        })
    }
}
