use crate::models::{Chunk, RetrievedChunk};
use crate::ProviderError;
use async_trait::async_trait;

/// A named vector-store collection holding (embedding, chunk text, metadata) points.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn collection(&self) -> &str;

    async fn collection_exists(&self) -> Result<bool, ProviderError>;

    /// Creates the collection with cosine distance and the given vector size.
    async fn create_collection(&self, vector_size: usize) -> Result<(), ProviderError>;

    async fn upsert_chunks(
        &self,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), ProviderError>;

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, ProviderError>;

    async fn delete_collection(&self) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}
