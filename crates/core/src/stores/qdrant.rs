use crate::config::StoreConfig;
use crate::models::{Chunk, RetrievedChunk};
use crate::traits::VectorIndex;
use crate::ProviderError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, error, info};

const BACKEND: &str = "qdrant";

/// Qdrant collection accessed through the REST API.
pub struct QdrantStore {
    endpoint: String,
    collection: String,
    api_key: Option<String>,
    client: Client,
}

impl QdrantStore {
    pub fn new(config: &StoreConfig) -> Result<Self, ProviderError> {
        let endpoint = url::Url::parse(config.url.trim())?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    async fn check(response: Response, operation: &str) -> Result<Response, ProviderError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let details = response.text().await.unwrap_or_default();
        error!(%status, operation, "qdrant request failed");
        Err(ProviderError::BackendResponse {
            backend: BACKEND.to_string(),
            status: status.as_u16(),
            details,
        })
    }
}

fn point_payload(chunk: &Chunk) -> Value {
    json!({
        "page_content": chunk.text,
        "metadata": {
            "source": chunk.source,
            "page": chunk.page,
            "chunk_index": chunk.chunk_index,
            "start_index": chunk.start_index,
        },
    })
}

fn build_points(chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<Vec<Value>, ProviderError> {
    if chunks.len() != embeddings.len() {
        return Err(ProviderError::Request(format!(
            "embedding count {} doesn't match chunk count {}",
            embeddings.len(),
            chunks.len()
        )));
    }

    Ok(chunks
        .iter()
        .zip(embeddings.iter())
        .map(|(chunk, embedding)| {
            json!({
                "id": chunk.chunk_id,
                "vector": embedding,
                "payload": point_payload(chunk),
            })
        })
        .collect())
}

fn parse_hits(parsed: &Value) -> Vec<RetrievedChunk> {
    let hits = parsed
        .pointer("/result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    hits.iter()
        .map(|hit| {
            let id = match hit.pointer("/id") {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => String::new(),
            };
            RetrievedChunk {
                id,
                score: hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0),
                text: hit
                    .pointer("/payload/page_content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                source: hit
                    .pointer("/payload/metadata/source")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                page: hit
                    .pointer("/payload/metadata/page")
                    .and_then(Value::as_u64)
                    .map(|page| page as u32),
            }
        })
        .collect()
}

#[async_trait]
impl VectorIndex for QdrantStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn collection_exists(&self) -> Result<bool, ProviderError> {
        let response = self
            .authorize(self.client.get(self.collection_url()))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response, "get collection").await?;
        Ok(true)
    }

    async fn create_collection(&self, vector_size: usize) -> Result<(), ProviderError> {
        info!(collection = %self.collection, vector_size, "creating qdrant collection");
        let response = self
            .authorize(self.client.put(self.collection_url()))
            .json(&json!({
                "vectors": {
                    "size": vector_size,
                    "distance": "Cosine",
                }
            }))
            .send()
            .await?;
        Self::check(response, "create collection").await?;
        Ok(())
    }

    async fn upsert_chunks(
        &self,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), ProviderError> {
        let points = build_points(chunks, embeddings)?;
        if points.is_empty() {
            return Ok(());
        }

        debug!(collection = %self.collection, points = points.len(), "upserting points");
        let response = self
            .authorize(
                self.client
                    .put(format!("{}/points?wait=true", self.collection_url())),
            )
            .json(&json!({ "points": points }))
            .send()
            .await?;
        Self::check(response, "upsert points").await?;
        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, ProviderError> {
        let response = self
            .authorize(
                self.client
                    .post(format!("{}/points/search", self.collection_url())),
            )
            .json(&json!({
                "vector": query_vector,
                "limit": top_k,
                "with_payload": true,
            }))
            .send()
            .await?;
        let response = Self::check(response, "search points").await?;
        let parsed: Value = response.json().await?;
        Ok(parse_hits(&parsed))
    }

    async fn delete_collection(&self) -> Result<(), ProviderError> {
        info!(collection = %self.collection, "deleting qdrant collection");
        let response = self
            .authorize(self.client.delete(self.collection_url()))
            .send()
            .await?;
        Self::check(response, "delete collection").await?;
        Ok(())
    }
}
