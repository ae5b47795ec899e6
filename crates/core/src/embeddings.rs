use crate::config::EmbeddingConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = crate::models::DEFAULT_VECTOR_SIZE;

const BATCH_SIZE: usize = 32;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Request("embedder returned no vectors".to_string()))
    }
}

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct HttpEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let base = url::Url::parse(config.endpoint.trim_end_matches('/'))?;
        Ok(Self {
            client,
            url: format!("{}/v1/embeddings", base.as_str().trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
            api_key: config.api_key.clone(),
        })
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let details = response.text().await.unwrap_or_default();
            error!(%status, url = %self.url, "embedding request failed");
            return Err(ProviderError::BackendResponse {
                backend: "embeddings".to_string(),
                status: status.as_u16(),
                details,
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        order_vectors(parsed, texts.len(), self.dimensions)
    }
}

fn order_vectors(
    mut parsed: EmbeddingResponse,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>, ProviderError> {
    if parsed.data.len() != expected {
        return Err(ProviderError::Request(format!(
            "embedding count {} doesn't match input count {expected}",
            parsed.data.len()
        )));
    }

    parsed
        .data
        .sort_by_key(|item| item.index.unwrap_or(usize::MAX));

    parsed
        .data
        .into_iter()
        .map(|item| {
            if item.embedding.len() != dimensions {
                return Err(ProviderError::DimensionMismatch {
                    expected: dimensions,
                    actual: item.embedding.len(),
                });
            }
            Ok(item.embedding)
        })
        .collect()
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            debug!(batch = batch.len(), model = %self.model, "embedding batch");
            vectors.extend(self.request(batch).await?);
        }
        Ok(vectors)
    }
}

/// Offline embedder hashing character trigrams into a fixed number of buckets.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl CharacterNgramEmbedder {
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl Embedder for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
