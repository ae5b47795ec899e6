pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod loader;
pub mod models;
pub mod query;
pub mod reset;
pub mod stores;
#[cfg(test)]
mod testing;
pub mod traits;

pub use chunking::{split_documents, ChunkingConfig};
pub use config::{EmbeddingConfig, LlmConfig, StoreConfig};
pub use embeddings::{CharacterNgramEmbedder, Embedder, HttpEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ConfigError, ErrorClass, IngestError, PipelineError, ProviderError};
pub use ingest::{discover_pdf_files, ensure_collection, ingest_chunks, ingest_path, ingest_pdf};
pub use llm::GroqClient;
pub use loader::{load_documents, load_documents_as, LopdfExtractor, PageText, PdfExtractor};
pub use models::{
    Chunk, IngestionOptions, IngestionReport, PageDocument, QaAnswer, ResetOutcome,
    RetrievedChunk, DEFAULT_COLLECTION, DEFAULT_TOP_K, DEFAULT_VECTOR_SIZE,
};
pub use query::{answer_question, build_prompt, format_context};
pub use reset::clear_collection;
pub use stores::{InMemoryStore, QdrantStore};
pub use traits::{AnswerGenerator, VectorIndex};
