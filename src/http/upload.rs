//! Video upload for transcription
//!
//! `POST /transcribe` takes a multipart `video` field, forwards it to the
//! transcription service and answers `{ "text": ... }`. With
//! `?session=<id>` the named playback session is locked while the request
//! is outstanding and then either starts playing the transcript or alerts
//! the viewer.

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, SignError};
use crate::playback::PlaybackHandle;
use crate::state::AppState;
use crate::transcribe::{allowed_file, secure_filename, TranscriptionError};

#[derive(Debug, Deserialize)]
pub struct TranscribeQuery {
    pub session: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptReply {
    pub text: String,
}

pub async fn transcribe_upload(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TranscribeQuery>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptReply>> {
    let session = match query.session {
        Some(id) => Some(state.get_session(&id).ok_or(SignError::SessionNotFound(id))?),
        None => None,
    };

    let lock = TranscriptionLock::acquire(session);
    let result = transcribe_video(&state, &mut multipart).await;
    lock.release(match &result {
        Ok(text) => Ok(text.clone()),
        Err(e) => Err(alert_message(e)),
    });

    result.map(|text| Json(TranscriptReply { text }))
}

/// Keeps a session's input locked while its upload is outstanding.
///
/// Dropping the lock without `release` (the request was abandoned before
/// the transcript came back) unlocks the session with a network alert.
struct TranscriptionLock {
    session: Option<PlaybackHandle>,
}

impl TranscriptionLock {
    fn acquire(session: Option<PlaybackHandle>) -> Self {
        if let Some(session) = &session {
            session.begin_transcription();
        }
        Self { session }
    }

    fn release(mut self, result: std::result::Result<String, String>) {
        if let Some(session) = self.session.take() {
            session.finish_transcription(result);
        }
    }
}

impl Drop for TranscriptionLock {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            warn!("Upload for session {} abandoned before completion", session.id());
            session.finish_transcription(Err(NETWORK_ALERT.to_string()));
        }
    }
}

async fn transcribe_video(state: &AppState, multipart: &mut Multipart) -> Result<String> {
    let (file_name, data) =
        read_video_field(multipart, &state.config.transcription.allowed_extensions).await?;
    info!("Received upload {} ({} bytes)", file_name, data.len());

    let client = state
        .transcriber
        .as_ref()
        .ok_or(SignError::TranscriptionUnavailable)?;

    match client.transcribe(&file_name, data).await {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!("Transcription of {} failed: {}", file_name, e);
            Err(e.into())
        }
    }
}

/// Find the `video` field and check its file name
async fn read_video_field(
    multipart: &mut Multipart,
    allowed_extensions: &[String],
) -> Result<(String, Bytes)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("video") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(SignError::InvalidUpload("No selected file".to_string()));
        }
        if !allowed_file(&file_name, allowed_extensions) {
            return Err(SignError::InvalidUpload("File type not allowed".to_string()));
        }
        let data = field.bytes().await?;
        return Ok((secure_filename(&file_name), data));
    }
    Err(SignError::InvalidUpload("No video file part".to_string()))
}

const NETWORK_ALERT: &str = "Network Error: Could not connect to server.";

/// Text of the alert shown to the viewer
fn alert_message(err: &SignError) -> String {
    match err {
        SignError::Transcription(
            TranscriptionError::Network(_) | TranscriptionError::InvalidResponse(_),
        ) => NETWORK_ALERT.to_string(),
        SignError::Transcription(e) => e.to_string(),
        other => format!("Server Error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{spawn_session, ClientMessage, ServerMessage};
    use crate::sign::{SpeedRange, SymbolResolver, VisualUnit};
    use tokio::sync::mpsc::UnboundedReceiver;

    #[test]
    fn test_alert_messages() {
        assert_eq!(
            alert_message(&SignError::InvalidUpload("No selected file".into())),
            "Server Error: No selected file"
        );
        assert_eq!(
            alert_message(&SignError::Transcription(TranscriptionError::Server(
                "model crashed".into()
            ))),
            "Server Error: model crashed"
        );
        assert_eq!(
            alert_message(&SignError::TranscriptionUnavailable),
            "Server Error: Transcription service is not configured"
        );
    }

    #[test]
    fn test_unreadable_reply_alerts_as_network_error() {
        assert_eq!(
            alert_message(&SignError::Transcription(
                TranscriptionError::InvalidResponse("expected value".into())
            )),
            NETWORK_ALERT
        );
    }

    fn session() -> (PlaybackHandle, UnboundedReceiver<ServerMessage>) {
        let (handle, rx, _task) =
            spawn_session(Uuid::new_v4(), SymbolResolver::default(), SpeedRange::default());
        (handle, rx)
    }

    async fn drain_until_unlocked(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut seen = Vec::new();
        while let Some(message) = rx.recv().await {
            let unlocked = message == ServerMessage::InputLocked { locked: false };
            seen.push(message);
            if unlocked {
                break;
            }
        }
        seen
    }

    #[tokio::test]
    async fn test_abandoned_lock_unlocks_session() {
        let (handle, mut rx) = session();
        let lock = TranscriptionLock::acquire(Some(handle.clone()));
        drop(lock);

        let seen = drain_until_unlocked(&mut rx).await;
        assert!(seen.contains(&ServerMessage::InputLocked { locked: true }));
        assert!(seen.contains(&ServerMessage::Alert {
            message: NETWORK_ALERT.to_string()
        }));

        handle.client(ClientMessage::Convert {
            text: "$".to_string(),
        });
        loop {
            match rx.recv().await.unwrap() {
                ServerMessage::Show { unit, .. } => {
                    assert_eq!(unit, VisualUnit::Unsupported { symbol: '$' });
                    break;
                }
                _ => continue,
            }
        }
        assert!(!handle.snapshot().input_locked);
    }

    #[tokio::test]
    async fn test_released_lock_does_not_alert() {
        let (handle, mut rx) = session();
        let lock = TranscriptionLock::acquire(Some(handle.clone()));
        lock.release(Ok("b".to_string()));

        let seen = drain_until_unlocked(&mut rx).await;
        assert!(!seen
            .iter()
            .any(|m| matches!(m, ServerMessage::Alert { .. })));
        handle.shutdown();
    }
}
