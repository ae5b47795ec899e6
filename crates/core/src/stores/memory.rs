use crate::models::{Chunk, RetrievedChunk};
use crate::traits::VectorIndex;
use crate::ProviderError;
use async_trait::async_trait;
use tokio::sync::RwLock;

const BACKEND: &str = "memory";

struct StoredPoint {
    chunk: Chunk,
    vector: Vec<f32>,
}

struct Collection {
    vector_size: usize,
    points: Vec<StoredPoint>,
}

/// Process-local collection with cosine ranking, for offline runs and tests.
pub struct InMemoryStore {
    collection: String,
    state: RwLock<Option<Collection>>,
}

impl InMemoryStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            state: RwLock::new(None),
        }
    }

    pub async fn point_count(&self) -> usize {
        self.state
            .read()
            .await
            .as_ref()
            .map(|collection| collection.points.len())
            .unwrap_or(0)
    }

    fn missing(&self) -> ProviderError {
        ProviderError::BackendResponse {
            backend: BACKEND.to_string(),
            status: 404,
            details: format!("collection '{}' does not exist", self.collection),
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn collection_exists(&self) -> Result<bool, ProviderError> {
        Ok(self.state.read().await.is_some())
    }

    async fn create_collection(&self, vector_size: usize) -> Result<(), ProviderError> {
        let mut state = self.state.write().await;
        if state.is_some() {
            return Err(ProviderError::BackendResponse {
                backend: BACKEND.to_string(),
                status: 409,
                details: format!("collection '{}' already exists", self.collection),
            });
        }
        *state = Some(Collection {
            vector_size,
            points: Vec::new(),
        });
        Ok(())
    }

    async fn upsert_chunks(
        &self,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), ProviderError> {
        if chunks.len() != embeddings.len() {
            return Err(ProviderError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut state = self.state.write().await;
        let collection = state.as_mut().ok_or_else(|| self.missing())?;

        if let Some(bad) = embeddings
            .iter()
            .find(|vector| vector.len() != collection.vector_size)
        {
            return Err(ProviderError::DimensionMismatch {
                expected: collection.vector_size,
                actual: bad.len(),
            });
        }

        for (chunk, vector) in chunks.iter().zip(embeddings.iter()) {
            collection
                .points
                .retain(|point| point.chunk.chunk_id != chunk.chunk_id);
            collection.points.push(StoredPoint {
                chunk: chunk.clone(),
                vector: vector.clone(),
            });
        }
        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, ProviderError> {
        let state = self.state.read().await;
        let collection = state.as_ref().ok_or_else(|| self.missing())?;

        if query_vector.len() != collection.vector_size {
            return Err(ProviderError::DimensionMismatch {
                expected: collection.vector_size,
                actual: query_vector.len(),
            });
        }

        let mut scored = collection
            .points
            .iter()
            .map(|point| RetrievedChunk {
                id: point.chunk.chunk_id.clone(),
                score: cosine_similarity(&point.vector, query_vector) as f64,
                text: point.chunk.text.clone(),
                source: Some(point.chunk.source.clone()),
                page: Some(point.chunk.page),
            })
            .collect::<Vec<_>>();

        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_collection(&self) -> Result<(), ProviderError> {
        let mut state = self.state.write().await;
        if state.take().is_none() {
            return Err(self.missing());
        }
        Ok(())
    }
}
