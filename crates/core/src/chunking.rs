use crate::error::IngestError;
use crate::models::{Chunk, IngestionOptions, PageDocument};
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl From<&IngestionOptions> for ChunkingConfig {
    fn from(value: &IngestionOptions) -> Self {
        Self {
            max_chars: value.chunk_max_chars,
            overlap_chars: value.chunk_overlap_chars,
        }
    }
}

impl ChunkingConfig {
    pub fn new(max_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chars,
            overlap_chars,
        }
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap ({}) must be less than max_chars ({})",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }

    fn splitter(&self) -> Result<TextSplitter<text_splitter::Characters>, IngestError> {
        self.validate()?;
        let config = ChunkConfig::new(self.max_chars)
            .with_overlap(self.overlap_chars)
            .map_err(|error| IngestError::InvalidChunkConfig(error.to_string()))?;
        Ok(TextSplitter::new(config))
    }
}

/// Splits pages into overlapping chunks of at most `max_chars` characters.
///
/// Boundaries are picked by `text-splitter`, which prefers paragraph breaks,
/// then line breaks, sentences and words before cutting inside a word. Every
/// chunk inherits its page's source and page index.
pub fn split_documents(
    documents: &[PageDocument],
    config: ChunkingConfig,
) -> Result<Vec<Chunk>, IngestError> {
    if documents.is_empty() {
        error!("no documents provided to split");
        return Err(IngestError::InvalidArgument(
            "no documents provided to split".to_string(),
        ));
    }

    let splitter = config.splitter()?;
    info!(
        max_chars = config.max_chars,
        overlap_chars = config.overlap_chars,
        pages = documents.len(),
        "splitting documents"
    );

    let mut chunks = Vec::new();
    let mut cursor = 0u64;

    for document in documents {
        for (offset, piece) in splitter.chunk_indices(&document.text) {
            chunks.push(Chunk {
                chunk_id: Uuid::new_v4().to_string(),
                source: document.source.clone(),
                page: document.page,
                chunk_index: cursor,
                start_index: offset,
                text: piece.to_string(),
            });
            cursor = cursor.saturating_add(1);
        }
    }

    info!(chunks = chunks.len(), "documents split");
    Ok(chunks)
}
