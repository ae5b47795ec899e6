use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLLECTION: &str = "rag";
pub const DEFAULT_TOP_K: usize = 20;
pub const DEFAULT_VECTOR_SIZE: usize = 768;

/// One page of extracted PDF text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageDocument {
    pub source: String,
    /// Zero-based page index.
    pub page: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub chunk_id: String,
    pub source: String,
    pub page: u32,
    pub chunk_index: u64,
    /// Byte offset of the chunk inside its page text.
    pub start_index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    pub id: String,
    pub score: f64,
    pub text: String,
    pub source: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub chunk_max_chars: usize,
    pub chunk_overlap_chars: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_max_chars: 2_000,
            chunk_overlap_chars: 400,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub pages: usize,
    pub chunks: usize,
    pub collection_created: bool,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QaAnswer {
    pub question: String,
    pub answer: String,
    pub context: Vec<RetrievedChunk>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ResetOutcome {
    Deleted,
    NothingToDelete,
}

impl ResetOutcome {
    pub fn deleted(self) -> bool {
        matches!(self, ResetOutcome::Deleted)
    }
}
