use crate::api_error::{ApiError, ApiResult};
use crate::pipeline::Pipeline;
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use pdf_qa_core::{IngestError, ResetOutcome};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;
const PROCESS_SUCCESS_MESSAGE: &str = "Document processed and uploaded to Qdrant successfully.";
const DEFAULT_UPLOAD_NAME: &str = "upload.pdf";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub deleted: bool,
    pub message: &'static str,
}

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

pub fn app_router(pipeline: Pipeline) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/process/", post(process_document))
        .route("/ask/", post(ask_question))
        .route("/reset/", post(reset_collection))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

pub async fn run_server(bind: &str, pipeline: Pipeline) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(address = %listener.local_addr()?, "pdf-qa listening");

    axum::serve(listener, app_router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("pdf-qa stopped");
    Ok(())
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn dashboard() -> impl IntoResponse {
    Html(include_str!("../ui/index.html"))
}

async fn read_upload(multipart: &mut Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(err.body_text()))?;
        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::BadRequest(
        "multipart field 'file' is required".to_string(),
    ))
}

async fn process_document(
    State(pipeline): State<Pipeline>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProcessResponse>> {
    let store_config = pipeline.store_config().map_err(|err| {
        error!(error = %err, "qdrant url or api key not set");
        ApiError::from_pipeline(err.into())
    })?;

    let upload = read_upload(&mut multipart).await?;
    info!(file_name = %upload.file_name, bytes = upload.bytes.len(), "pdf upload received");

    let temp = tempfile::Builder::new()
        .prefix("pdf-qa-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|err| ApiError::from_pipeline(IngestError::Io(err).into()))?;
    tokio::fs::write(temp.path(), &upload.bytes)
        .await
        .map_err(|err| ApiError::from_pipeline(IngestError::Io(err).into()))?;

    let report = pipeline
        .ingest_upload(&store_config, temp.path(), &upload.file_name)
        .await
        .map_err(ApiError::from_pipeline)?;

    info!(
        file_name = %upload.file_name,
        pages = report.pages,
        chunks = report.chunks,
        "document processed"
    );
    Ok(Json(ProcessResponse {
        message: PROCESS_SUCCESS_MESSAGE,
    }))
}

async fn ask_question(
    State(pipeline): State<Pipeline>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> ApiResult<Json<AskResponse>> {
    let Json(request) = payload?;

    let answer = pipeline
        .ask(&request.question)
        .await
        .map_err(ApiError::from_query)?;

    Ok(Json(AskResponse {
        question: request.question,
        answer: answer.answer,
    }))
}

async fn reset_collection(State(pipeline): State<Pipeline>) -> ApiResult<Json<ResetResponse>> {
    let outcome = pipeline
        .reset()
        .await
        .map_err(ApiError::from_pipeline)?;

    let message = match outcome {
        ResetOutcome::Deleted => "Previous vectors deleted.",
        ResetOutcome::NothingToDelete => "Collection is already empty or does not exist.",
    };
    Ok(Json(ResetResponse {
        deleted: outcome.deleted(),
        message,
    }))
}
