//! WebSocket endpoint for playback sessions
//!
//! One session per connection. Viewer messages are forwarded to the
//! session task; everything the session emits is written back as JSON text
//! frames. The session is torn down when either direction ends.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::playback::ClientMessage;
use crate::state::AppState;

/// Upgrade to a playback session
pub async fn playback_socket(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_session(state, socket))
}

async fn run_session(state: Arc<AppState>, socket: WebSocket) {
    let (handle, mut outgoing) = state.open_session();
    let id = handle.id();
    let (mut sink, mut stream) = socket.split();
    info!("Viewer connected to session {}", id);

    let session_to_viewer = async {
        while let Some(message) = outgoing.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!("Session {}: failed to encode message: {}", id, e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                debug!("Session {}: error sending to viewer: {}", id, e);
                break;
            }
        }
    };

    let viewer_to_session = async {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match ClientMessage::parse(text.as_str()) {
                    Ok(message) => {
                        if !handle.client(message) {
                            break;
                        }
                    }
                    Err(e) => warn!("Session {}: ignoring malformed message: {}", id, e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Session {}: viewer WebSocket error: {}", id, e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = session_to_viewer => {},
        _ = viewer_to_session => {},
    }

    state.close_session(id);
    info!("Viewer disconnected from session {}", id);
}
