use clap::ValueEnum;
use pdf_qa_core::config::env_lookup;
use pdf_qa_core::{
    AnswerGenerator, CharacterNgramEmbedder, Embedder, EmbeddingConfig, GroqClient, HttpEmbedder,
    InMemoryStore, LlmConfig, ProviderError, QdrantStore, StoreConfig, VectorIndex,
};
use std::sync::Arc;

/// Environment lookup shared by every request.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub fn process_env() -> EnvLookup {
    Arc::new(env_lookup)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Qdrant over REST, configured by `qdrant_url` and `qdrant_api`.
    Qdrant,
    /// Process-local vectors without credentials; data lives only as long as
    /// one `serve` or `batch` run.
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    Http,
    Hashed,
}

/// Builds the pipeline collaborators from per-request configuration.
pub trait Backends: Send + Sync {
    fn store(&self, config: &StoreConfig) -> Result<Arc<dyn VectorIndex>, ProviderError>;

    fn embedder(&self, config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, ProviderError>;

    fn generator(&self, config: &LlmConfig) -> Result<Arc<dyn AnswerGenerator>, ProviderError>;

    /// Whether `store` needs `qdrant_url` and `qdrant_api`.
    fn needs_store_credentials(&self) -> bool {
        true
    }
}

pub struct LiveBackends {
    store_kind: StoreKind,
    embedder_kind: EmbedderKind,
    collection: String,
    memory: Arc<InMemoryStore>,
}

impl LiveBackends {
    pub fn new(store_kind: StoreKind, embedder_kind: EmbedderKind, collection: &str) -> Self {
        Self {
            store_kind,
            embedder_kind,
            collection: collection.to_string(),
            memory: Arc::new(InMemoryStore::new(collection)),
        }
    }
}

impl Backends for LiveBackends {
    fn store(&self, config: &StoreConfig) -> Result<Arc<dyn VectorIndex>, ProviderError> {
        let store: Arc<dyn VectorIndex> = match self.store_kind {
            StoreKind::Qdrant => {
                let config = config.clone().with_collection(self.collection.as_str());
                Arc::new(QdrantStore::new(&config)?)
            }
            StoreKind::Memory => self.memory.clone(),
        };
        Ok(store)
    }

    fn embedder(&self, config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, ProviderError> {
        let embedder: Arc<dyn Embedder> = match self.embedder_kind {
            EmbedderKind::Http => Arc::new(HttpEmbedder::new(config)?),
            EmbedderKind::Hashed => Arc::new(CharacterNgramEmbedder::default()),
        };
        Ok(embedder)
    }

    fn generator(&self, config: &LlmConfig) -> Result<Arc<dyn AnswerGenerator>, ProviderError> {
        Ok(Arc::new(GroqClient::new(config)?))
    }

    fn needs_store_credentials(&self) -> bool {
        self.store_kind == StoreKind::Qdrant
    }
}
