use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdf_qa_core::{ErrorClass, PipelineError};
use serde::Serialize;
use thiserror::Error;

pub const ASK_FAILURE_MESSAGE: &str = "An error occurred while retrieving the answer.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Configuration and input failures are the caller's to fix; everything
    /// else is a 500 carrying the pipeline's message.
    pub fn from_pipeline(err: PipelineError) -> Self {
        match err.class() {
            ErrorClass::Configuration | ErrorClass::Input => ApiError::BadRequest(err.to_string()),
            ErrorClass::NoCorpus | ErrorClass::Provider => ApiError::Internal(err.to_string()),
        }
    }

    /// Question answering hides provider details behind a generic message.
    pub fn from_query(err: PipelineError) -> Self {
        match err.class() {
            ErrorClass::Input => ApiError::BadRequest(err.to_string()),
            ErrorClass::NoCorpus => ApiError::Internal(err.to_string()),
            ErrorClass::Configuration | ErrorClass::Provider => {
                ApiError::Internal(ASK_FAILURE_MESSAGE.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_qa_core::{ConfigError, ProviderError};

    fn provider_failure() -> PipelineError {
        PipelineError::Provider(ProviderError::BackendResponse {
            backend: "groq".to_string(),
            status: 401,
            details: "invalid api key".to_string(),
        })
    }

    #[test]
    fn missing_credentials_are_a_bad_request_on_upload() {
        let err = ApiError::from_pipeline(ConfigError::MissingEnv("qdrant_url").into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("qdrant_url"));
    }

    #[test]
    fn upload_failures_keep_their_message() {
        let err = ApiError::from_pipeline(provider_failure());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("invalid api key"));
    }

    #[test]
    fn ask_failures_are_generic() {
        let err = ApiError::from_query(provider_failure());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), ASK_FAILURE_MESSAGE);

        let err = ApiError::from_query(ConfigError::MissingEnv("groq_api").into());
        assert_eq!(err.to_string(), ASK_FAILURE_MESSAGE);
    }

    #[test]
    fn missing_corpus_is_reported_on_ask() {
        let err = ApiError::from_query(PipelineError::NoDocuments(
            "collection 'rag' does not exist, upload a document first".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("upload a document first"));
    }
}
