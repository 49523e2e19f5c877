//! Pinecone vector index backend.
//!
//! Talks to the Pinecone REST API directly with `reqwest`: the control
//! plane for index existence/creation checks and the per-index data plane
//! for upserts and filtered queries. The data-plane host is resolved once
//! from the control plane and cached for the life of the process.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::document::{ChunkMetadata, ScoredMatch, VectorRecord};
use crate::error::{RagError, Result};
use crate::index::{QueryFilter, VectorIndex};

/// The Pinecone control-plane base URL.
const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// The default index name when `PINECONE_INDEX_NAME` is unset.
const DEFAULT_INDEX_NAME: &str = "finreports";

/// The default serverless region when `PINECONE_ENVIRONMENT` is unset.
const DEFAULT_REGION: &str = "us-east-1";

/// A [`VectorIndex`] backed by a hosted Pinecone serverless index with
/// cosine metric.
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    region: String,
    control_url: String,
    host: OnceCell<String>,
}

impl PineconeIndex {
    /// Create a new Pinecone index handle.
    pub fn new(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Config("Pinecone API key must not be empty".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            index_name: index_name.into(),
            region: region.into(),
            control_url: CONTROL_PLANE_URL.to_string(),
            host: OnceCell::new(),
        })
    }

    /// Create a handle from `PINECONE_API_KEY`, `PINECONE_INDEX_NAME`
    /// (default `finreports`), and `PINECONE_ENVIRONMENT` (default
    /// `us-east-1`).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY").map_err(|_| {
            RagError::Config("PINECONE_API_KEY environment variable not set".to_string())
        })?;
        let index_name =
            std::env::var("PINECONE_INDEX_NAME").unwrap_or_else(|_| DEFAULT_INDEX_NAME.to_string());
        let region =
            std::env::var("PINECONE_ENVIRONMENT").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        Self::new(api_key, index_name, region)
    }

    /// Override the control-plane base URL (tests).
    pub fn with_control_url(mut self, url: impl Into<String>) -> Self {
        self.control_url = url.into();
        self
    }

    fn index_error(message: impl Into<String>) -> RagError {
        RagError::Index { backend: "Pinecone".to_string(), message: message.into() }
    }

    /// Describe the index on the control plane, returning `None` on 404.
    async fn describe(&self) -> Result<Option<IndexDescription>> {
        let response = self
            .client
            .get(format!("{}/indexes/{}", self.control_url, self.index_name))
            .header("Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| Self::index_error(format!("describe request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::index_error(format!("describe returned {status}: {body}")));
        }

        let description = response
            .json::<IndexDescription>()
            .await
            .map_err(|e| Self::index_error(format!("failed to parse index description: {e}")))?;
        Ok(Some(description))
    }

    async fn create(&self, dimensions: usize) -> Result<IndexDescription> {
        let body = json!({
            "name": self.index_name,
            "dimension": dimensions,
            "metric": "cosine",
            "spec": {
                "serverless": { "cloud": "aws", "region": self.region }
            }
        });

        let response = self
            .client
            .post(format!("{}/indexes", self.control_url))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::index_error(format!("create request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::index_error(format!("create returned {status}: {body}")));
        }

        info!(index = %self.index_name, dimensions, "created Pinecone index");
        response
            .json::<IndexDescription>()
            .await
            .map_err(|e| Self::index_error(format!("failed to parse created index: {e}")))
    }

    /// The cached data-plane base URL, resolving it on first use.
    async fn data_url(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let description = self
                    .describe()
                    .await?
                    .ok_or_else(|| Self::index_error("index does not exist".to_string()))?;
                Ok::<_, RagError>(normalize_host(&description.host))
            })
            .await?;
        Ok(host)
    }
}

/// Control-plane description of an index.
#[derive(Debug, Deserialize)]
struct IndexDescription {
    dimension: usize,
    host: String,
}

/// Pinecone reports bare hostnames for the data plane.
fn normalize_host(host: &str) -> String {
    if host.contains("://") { host.to_string() } else { format!("https://{host}") }
}

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<Value>,
}

#[derive(Deserialize)]
struct PineconeQueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Deserialize)]
struct PineconeMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Value,
}

/// Map a Pinecone metadata payload back into [`ChunkMetadata`].
///
/// Pinecone returns numeric metadata as floats, so the counters are read
/// through `as_f64`.
fn metadata_from_value(value: &Value) -> ChunkMetadata {
    let str_field = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
    let num_field = |key: &str| value.get(key).and_then(Value::as_f64).unwrap_or_default() as usize;

    ChunkMetadata {
        user_id: str_field("user_id"),
        filename: str_field("filename"),
        source: str_field("source"),
        document_type: str_field("document_type"),
        document_id: str_field("document_id"),
        chunk_index: num_field("chunk_index"),
        text: str_field("text"),
        total_chunks: num_field("total_chunks"),
    }
}

/// Build the metadata filter object for a query.
fn filter_to_value(filter: &QueryFilter) -> Value {
    let mut object = serde_json::Map::new();
    object.insert("user_id".to_string(), json!({ "$eq": filter.user_id }));
    if let Some(document_id) = &filter.document_id {
        object.insert("document_id".to_string(), json!({ "$eq": document_id }));
    }
    Value::Object(object)
}

#[async_trait::async_trait]
impl VectorIndex for PineconeIndex {
    async fn ensure_ready(&self, dimensions: usize) -> Result<()> {
        let description = match self.describe().await? {
            Some(description) => description,
            None => self.create(dimensions).await?,
        };

        if description.dimension != dimensions {
            return Err(RagError::Config(format!(
                "Pinecone index '{}' has dimension {}, expected {}; \
                 delete and recreate the index with the correct dimension",
                self.index_name, description.dimension, dimensions
            )));
        }

        let host = normalize_host(&description.host);
        let _ = self.host.set(host);
        debug!(index = %self.index_name, dimensions, "Pinecone index ready");
        Ok(())
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let vectors = records
            .iter()
            .map(|record| {
                Ok(json!({
                    "id": record.id,
                    "values": record.values,
                    "metadata": serde_json::to_value(&record.metadata)
                        .map_err(|e| Self::index_error(format!("metadata serialization: {e}")))?,
                }))
            })
            .collect::<Result<Vec<Value>>>()?;

        let url = format!("{}/vectors/upsert", self.data_url().await?);
        let response = self
            .client
            .post(url)
            .header("Api-Key", &self.api_key)
            .json(&UpsertRequest { vectors })
            .send()
            .await
            .map_err(|e| Self::index_error(format!("upsert request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::index_error(format!("upsert returned {status}: {body}")));
        }

        debug!(index = %self.index_name, count = records.len(), "upserted records");
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &QueryFilter,
    ) -> Result<Vec<ScoredMatch>> {
        let body = json!({
            "vector": embedding,
            "topK": top_k,
            "includeMetadata": true,
            "filter": filter_to_value(filter),
        });

        let url = format!("{}/query", self.data_url().await?);
        let response = self
            .client
            .post(url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::index_error(format!("query request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::index_error(format!("query returned {status}: {body}")));
        }

        let query_response: PineconeQueryResponse = response
            .json()
            .await
            .map_err(|e| Self::index_error(format!("failed to parse query response: {e}")))?;

        Ok(query_response
            .matches
            .into_iter()
            .map(|hit| ScoredMatch {
                id: hit.id,
                score: hit.score,
                metadata: metadata_from_value(&hit.metadata),
            })
            .collect())
    }
}
