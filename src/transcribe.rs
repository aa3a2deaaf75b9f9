//! Client for the external transcription service
//!
//! The service takes a multipart upload with a `video` field and answers
//! with `{ "text": ... }` on success or `{ "error": ... }` on failure.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::TranscriptionConfig;

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("Network Error: Could not connect to server: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server Error: {0}")]
    Server(String),

    #[error("Invalid response from transcription service: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct TranscriptionReply {
    text: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl TranscriptionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TranscriptionError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Build a client when an endpoint is configured
    pub fn from_config(config: &TranscriptionConfig) -> Result<Option<Self>, TranscriptionError> {
        config
            .endpoint
            .as_ref()
            .map(|endpoint| Self::new(endpoint.clone(), config.timeout()))
            .transpose()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload a video and return its transcript
    pub async fn transcribe(&self, file_name: &str, data: Bytes) -> Result<String, TranscriptionError> {
        info!(
            "Sending {} ({} bytes) to {} for transcription",
            file_name,
            data.len(),
            self.endpoint
        );

        let part = Part::bytes(data.to_vec()).file_name(file_name.to_string());
        let form = Form::new().part("video", part);

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Transcription service answered {} ({} bytes)", status, body.len());

        let reply: TranscriptionReply = match serde_json::from_str(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(TranscriptionError::Server(format!("HTTP {}", status)))
            }
            Err(e) => return Err(TranscriptionError::InvalidResponse(e.to_string())),
        };

        match reply {
            TranscriptionReply {
                error: Some(error), ..
            } => Err(TranscriptionError::Server(error)),
            TranscriptionReply {
                text: Some(text), ..
            } if status.is_success() => {
                info!("Transcription complete, {} chars", text.chars().count());
                Ok(text)
            }
            _ if !status.is_success() => Err(TranscriptionError::Server(format!("HTTP {}", status))),
            _ => Err(TranscriptionError::InvalidResponse(
                "missing text field".to_string(),
            )),
        }
    }
}

/// Whether `file_name` has one of the accepted extensions
pub fn allowed_file(file_name: &str, allowed_extensions: &[String]) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_lowercase();
            allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}

/// Reduce an uploaded file name to a safe ASCII name without directories
pub fn secure_filename(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => cleaned.push(c),
            c if c.is_whitespace() => cleaned.push('_'),
            _ => {}
        }
    }

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};

    fn extensions() -> Vec<String> {
        TranscriptionConfig::default().allowed_extensions
    }

    #[test]
    fn test_allowed_file() {
        let exts = extensions();
        assert!(allowed_file("clip.mp4", &exts));
        assert!(allowed_file("CLIP.MOV", &exts));
        assert!(allowed_file("my.holiday.mkv", &exts));
        assert!(!allowed_file("notes.txt", &exts));
        assert!(!allowed_file("mp4", &exts));
        assert!(!allowed_file("", &exts));
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("clip.mp4"), "clip.mp4");
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\videos\\my clip.avi"), "my_clip.avi");
        assert_eq!(secure_filename("..."), "upload");
        assert_eq!(secure_filename("ünïcødé.mov"), "ncd.mov");
    }

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/transcribe", addr)
    }

    async fn echo_upload(mut multipart: Multipart) -> Json<serde_json::Value> {
        while let Some(field) = multipart.next_field().await.unwrap() {
            if field.name() == Some("video") {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.unwrap();
                return Json(serde_json::json!({
                    "text": format!("{} {}", name, data.len())
                }));
            }
        }
        Json(serde_json::json!({ "error": "No video file part" }))
    }

    #[tokio::test]
    async fn test_transcribe_success() {
        let endpoint = spawn_upstream(Router::new().route("/transcribe", post(echo_upload))).await;
        let client = TranscriptionClient::new(endpoint, Duration::from_secs(5)).unwrap();

        let text = client
            .transcribe("hello.mp4", Bytes::from_static(b"12345"))
            .await
            .unwrap();
        assert_eq!(text, "hello.mp4 5");
    }

    #[tokio::test]
    async fn test_transcribe_server_error() {
        let router = Router::new().route(
            "/transcribe",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "model crashed" })),
                )
            }),
        );
        let endpoint = spawn_upstream(router).await;
        let client = TranscriptionClient::new(endpoint, Duration::from_secs(5)).unwrap();

        let err = client
            .transcribe("a.mp4", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Server(ref m) if m == "model crashed"));
        assert_eq!(err.to_string(), "Server Error: model crashed");
    }

    #[tokio::test]
    async fn test_transcribe_non_json_failure() {
        let router = Router::new().route(
            "/transcribe",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let endpoint = spawn_upstream(router).await;
        let client = TranscriptionClient::new(endpoint, Duration::from_secs(5)).unwrap();

        let err = client
            .transcribe("a.mp4", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Server(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn test_transcribe_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = TranscriptionClient::new(
            format!("http://{}/transcribe", addr),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = client
            .transcribe("a.mp4", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Network(_)));
    }

    #[test]
    fn test_from_config_without_endpoint() {
        let client = TranscriptionClient::from_config(&TranscriptionConfig::default()).unwrap();
        assert!(client.is_none());
    }
}
