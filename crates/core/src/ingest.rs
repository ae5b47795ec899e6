use crate::chunking::{split_documents, ChunkingConfig};
use crate::embeddings::Embedder;
use crate::error::{IngestError, PipelineError};
use crate::loader::load_documents_as;
use crate::models::{Chunk, IngestionOptions, IngestionReport, PageDocument};
use crate::traits::VectorIndex;
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Creates the collection if it is absent. Returns whether it was created.
pub async fn ensure_collection(
    store: &dyn VectorIndex,
    vector_size: usize,
) -> Result<bool, PipelineError> {
    if store.collection_exists().await? {
        info!(collection = store.collection(), "collection exists");
        return Ok(false);
    }

    info!(collection = store.collection(), vector_size, "collection does not exist, creating it");
    store.create_collection(vector_size).await?;
    Ok(true)
}

async fn store_chunks(
    chunks: &[Chunk],
    embedder: &dyn Embedder,
    store: &dyn VectorIndex,
) -> Result<IngestionReport, PipelineError> {
    let collection_created = ensure_collection(store, embedder.dimensions()).await?;

    let texts = chunks.iter().map(|chunk| chunk.text.as_str()).collect::<Vec<_>>();
    info!(chunks = texts.len(), "embedding chunks");
    let embeddings = embedder.embed_batch(&texts).await?;

    store.upsert_chunks(chunks, &embeddings).await?;

    let pages = chunks
        .iter()
        .map(|chunk| (chunk.source.as_str(), chunk.page))
        .collect::<HashSet<_>>()
        .len();

    Ok(IngestionReport {
        pages,
        chunks: chunks.len(),
        collection_created,
        ingested_at: Utc::now(),
    })
}

/// Embeds every chunk and writes all of them as new points.
///
/// An empty chunk list is rejected before the store is touched. Any embedding
/// or store failure aborts the whole call.
pub async fn ingest_chunks(
    chunks: &[Chunk],
    embedder: &dyn Embedder,
    store: &dyn VectorIndex,
) -> Result<IngestionReport, PipelineError> {
    if chunks.is_empty() {
        error!("no chunks to ingest");
        return Err(PipelineError::Input("no chunks to ingest".to_string()));
    }

    let result = store_chunks(chunks, embedder, store).await;

    match result {
        Ok(report) => {
            info!(
                collection = store.collection(),
                chunks = report.chunks,
                "documents uploaded"
            );
            Ok(report)
        }
        Err(err) => {
            error!(collection = store.collection(), error = %err, "document upload failed");
            Err(err)
        }
    }
}

async fn load_and_split(
    files: Vec<(PathBuf, String)>,
    options: &IngestionOptions,
) -> Result<(usize, Vec<Chunk>), PipelineError> {
    let config = ChunkingConfig::from(options);
    tokio::task::spawn_blocking(move || {
        let mut documents: Vec<PageDocument> = Vec::new();
        for (path, source) in &files {
            documents.extend(load_documents_as(path, source)?);
        }
        let chunks = split_documents(&documents, config)?;
        Ok::<_, IngestError>((documents.len(), chunks))
    })
    .await
    .map_err(|join_error| IngestError::Io(std::io::Error::other(join_error)))?
    .map_err(PipelineError::from)
}

/// Loads one PDF, splits it and stores its chunks.
///
/// `source` overrides the provenance recorded on every chunk; it defaults to
/// the file path.
pub async fn ingest_pdf(
    path: &Path,
    source: Option<&str>,
    options: &IngestionOptions,
    embedder: &dyn Embedder,
    store: &dyn VectorIndex,
) -> Result<IngestionReport, PipelineError> {
    let source = source
        .map(str::to_string)
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    let (pages, chunks) = load_and_split(vec![(path.to_path_buf(), source)], options)
        .await
        .map_err(|err| {
            error!(path = %path.display(), error = %err, "document preparation failed");
            err
        })?;

    let mut report = ingest_chunks(&chunks, embedder, store).await?;
    report.pages = pages;
    Ok(report)
}

/// Ingests a single PDF or every PDF found below a folder.
pub async fn ingest_path(
    path: &Path,
    options: &IngestionOptions,
    embedder: &dyn Embedder,
    store: &dyn VectorIndex,
) -> Result<IngestionReport, PipelineError> {
    if !path.is_dir() {
        return ingest_pdf(path, None, options, embedder, store).await;
    }

    let files = discover_pdf_files(path);
    if files.is_empty() {
        error!(folder = %path.display(), "no pdf files found");
        return Err(IngestError::InvalidArgument(format!(
            "no pdf files found in {}",
            path.display()
        ))
        .into());
    }

    info!(folder = %path.display(), files = files.len(), "ingesting folder");
    let files = files
        .into_iter()
        .map(|file| {
            let source = file.to_string_lossy().to_string();
            (file, source)
        })
        .collect();

    let (pages, chunks) = load_and_split(files, options).await?;
    let mut report = ingest_chunks(&chunks, embedder, store).await?;
    report.pages = pages;
    Ok(report)
}
