use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid response from {backend} ({status}): {details}")]
    BackendResponse {
        backend: String,
        status: u16,
        details: String,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("vector dimension {actual} does not match collection dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Coarse classification used by the HTTP API and the CLI to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    Input,
    NoCorpus,
    Provider,
}

/// The single error type surfaced by the ingestion, query and reset operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("invalid input: {0}")]
    Input(String),

    #[error("no documents available: {0}")]
    NoDocuments(String),
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::Config(_) => ErrorClass::Configuration,
            PipelineError::Input(_) => ErrorClass::Input,
            PipelineError::Ingest(IngestError::NotFound(_))
            | PipelineError::Ingest(IngestError::InvalidChunkConfig(_))
            | PipelineError::Ingest(IngestError::InvalidArgument(_)) => ErrorClass::Input,
            PipelineError::Ingest(_) => ErrorClass::Provider,
            PipelineError::NoDocuments(_) => ErrorClass::NoCorpus,
            PipelineError::Provider(_) => ErrorClass::Provider,
        }
    }
}
