use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use uuid::Uuid;

use crate::transcribe::TranscriptionError;

/// Main error type for the sign player
#[derive(Error, Debug)]
pub enum SignError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidUpload(String),

    #[error("Upload rejected: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Transcription service is not configured")]
    TranscriptionUnavailable,

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
}

impl SignError {
    pub fn status(&self) -> StatusCode {
        match self {
            SignError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            SignError::Multipart(e) => e.status(),
            SignError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SignError::TranscriptionUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            SignError::Transcription(_) => StatusCode::BAD_GATEWAY,
            SignError::Io(_) | SignError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SignError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SignError>;
