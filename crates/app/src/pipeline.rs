use crate::backends::{Backends, EnvLookup};
use pdf_qa_core::config::documents_path;
use pdf_qa_core::{
    answer_question, clear_collection, ingest_path, ingest_pdf, ConfigError, EmbeddingConfig,
    IngestionOptions, IngestionReport, LlmConfig, PipelineError, QaAnswer, ResetOutcome,
    StoreConfig, DEFAULT_TOP_K,
};
use std::path::Path;
use std::sync::Arc;

/// Wires the core operations to backends, reading configuration on every call.
#[derive(Clone)]
pub struct Pipeline {
    backends: Arc<dyn Backends>,
    lookup: EnvLookup,
}

impl Pipeline {
    pub fn new(backends: Arc<dyn Backends>, lookup: EnvLookup) -> Self {
        Self { backends, lookup }
    }

    /// Qdrant credentials are only read when the selected store needs them.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        if !self.backends.needs_store_credentials() {
            return Ok(StoreConfig::process_local());
        }
        StoreConfig::from_lookup(|key| (self.lookup)(key))
    }

    fn embedding_config(&self) -> Result<EmbeddingConfig, ConfigError> {
        EmbeddingConfig::from_lookup(|key| (self.lookup)(key))
    }

    fn llm_config(&self) -> Result<LlmConfig, ConfigError> {
        LlmConfig::from_lookup(|key| (self.lookup)(key))
    }

    pub fn documents_path(&self) -> Result<String, ConfigError> {
        documents_path(|key| (self.lookup)(key))
    }

    /// Ingests one uploaded PDF under the client-supplied file name.
    pub async fn ingest_upload(
        &self,
        store_config: &StoreConfig,
        path: &Path,
        source: &str,
    ) -> Result<IngestionReport, PipelineError> {
        let embedder = self.backends.embedder(&self.embedding_config()?)?;
        let store = self.backends.store(store_config)?;
        ingest_pdf(
            path,
            Some(source),
            &IngestionOptions::default(),
            embedder.as_ref(),
            store.as_ref(),
        )
        .await
    }

    /// Ingests a PDF file or every PDF below a folder.
    pub async fn ingest(&self, path: &Path) -> Result<IngestionReport, PipelineError> {
        let store = self.backends.store(&self.store_config()?)?;
        let embedder = self.backends.embedder(&self.embedding_config()?)?;
        ingest_path(
            path,
            &IngestionOptions::default(),
            embedder.as_ref(),
            store.as_ref(),
        )
        .await
    }

    pub async fn ask(&self, question: &str) -> Result<QaAnswer, PipelineError> {
        if question.trim().is_empty() {
            return Err(PipelineError::Input("question is empty".to_string()));
        }

        let store = self.backends.store(&self.store_config()?)?;
        let embedder = self.backends.embedder(&self.embedding_config()?)?;
        let generator = self.backends.generator(&self.llm_config()?)?;
        answer_question(
            question,
            DEFAULT_TOP_K,
            embedder.as_ref(),
            store.as_ref(),
            generator.as_ref(),
        )
        .await
    }

    pub async fn reset(&self) -> Result<ResetOutcome, PipelineError> {
        let store = self.backends.store(&self.store_config()?)?;
        clear_collection(store.as_ref()).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::backends::{EmbedderKind, LiveBackends, StoreKind};
    use pdf_qa_core::loader::fixtures::write_pdf;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_store_credentials_stop_before_any_backend_is_built() {
        let backends = FakeBackends::answering(Some("unused"));
        let pipeline = Pipeline::new(backends.clone(), lookup(&[("groq_api", "gsk-test")]));

        let err = pipeline.ask("Who is Mike?").await.unwrap_err();

        assert!(matches!(err, PipelineError::Config(ConfigError::MissingEnv("qdrant_url"))));
        assert_eq!(backends.calls(), 0);
    }

    #[tokio::test]
    async fn ingest_then_ask_then_reset() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("mike.pdf");
        write_pdf(&path, &["Mike is a teacher in Paris."])?;

        let backends = FakeBackends::answering(Some("Mike is a teacher."));
        let pipeline = Pipeline::new(backends.clone(), full_env());

        let report = pipeline.ingest(dir.path()).await?;
        assert_eq!(report.chunks, 1);

        let answer = pipeline.ask("Who is Mike?").await?;
        assert_eq!(answer.answer, "Mike is a teacher.");

        assert_eq!(pipeline.reset().await?, ResetOutcome::Deleted);
        assert_eq!(pipeline.reset().await?, ResetOutcome::NothingToDelete);
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_runs_without_qdrant_credentials() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("mike.pdf");
        write_pdf(&path, &["Mike is a teacher in Paris."])?;

        let backends = LiveBackends::new(StoreKind::Memory, EmbedderKind::Hashed, "rag");
        let pipeline = Pipeline::new(Arc::new(backends), lookup(&[]));

        let report = pipeline.ingest(&path).await?;
        assert_eq!(report.chunks, 1);
        assert_eq!(pipeline.reset().await?, ResetOutcome::Deleted);
        Ok(())
    }

    #[test]
    fn qdrant_store_requires_credentials() {
        let backends = LiveBackends::new(StoreKind::Qdrant, EmbedderKind::Hashed, "rag");
        let pipeline = Pipeline::new(Arc::new(backends), lookup(&[]));
        assert!(matches!(
            pipeline.store_config(),
            Err(ConfigError::MissingEnv("qdrant_url"))
        ));
    }

    #[tokio::test]
    async fn invalid_embedding_dimensions_stop_ingestion() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("mike.pdf");
        write_pdf(&path, &["Mike is a teacher in Paris."])?;

        let backends = FakeBackends::answering(None);
        let pipeline = Pipeline::new(
            backends.clone(),
            lookup(&[
                ("qdrant_url", "http://localhost:6333"),
                ("qdrant_api", "secret"),
                ("EMBEDDING_DIMENSIONS", "wide"),
            ]),
        );

        let err = pipeline.ingest(&path).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Config(ConfigError::Invalid { key: "EMBEDDING_DIMENSIONS", .. })
        ));
        assert_eq!(backends.embedder_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(backends.store.point_count().await, 0);
        Ok(())
    }

    #[test]
    fn documents_path_is_required() {
        let pipeline = Pipeline::new(FakeBackends::answering(None), full_env());
        assert!(matches!(
            pipeline.documents_path(),
            Err(ConfigError::MissingEnv("DOCUMENTS_PATH"))
        ));
    }
}
