//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Live playback sessions, one per connected viewer
//! - The symbol resolver and speed bounds handed to new sessions
//! - The transcription client, when an upstream is configured
//! - Server configuration

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::playback::{spawn_session, PlaybackHandle, ServerMessage, SessionSnapshot};
use crate::sign::{SpeedRange, SymbolResolver};
use crate::transcribe::{TranscriptionClient, TranscriptionError};

/// Application state shared across all handlers
pub struct AppState {
    /// Live sessions (session id -> handle)
    pub sessions: DashMap<Uuid, PlaybackHandle>,

    pub resolver: SymbolResolver,

    pub speed_range: SpeedRange,

    pub transcriber: Option<TranscriptionClient>,

    /// Sessions opened since startup
    pub sessions_opened: AtomicU64,

    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: ServerConfig) -> Result<Self, TranscriptionError> {
        Ok(Self {
            sessions: DashMap::new(),
            resolver: SymbolResolver::from_config(&config.assets),
            speed_range: SpeedRange::from_config(&config.playback),
            transcriber: TranscriptionClient::from_config(&config.transcription)?,
            sessions_opened: AtomicU64::new(0),
            config,
        })
    }

    /// Create AppState with default configuration
    pub fn with_defaults() -> Self {
        Self {
            sessions: DashMap::new(),
            resolver: SymbolResolver::default(),
            speed_range: SpeedRange::default(),
            transcriber: None,
            sessions_opened: AtomicU64::new(0),
            config: ServerConfig::default(),
        }
    }

    /// Start and register a playback session
    pub fn open_session(
        &self,
    ) -> (
        PlaybackHandle,
        tokio::sync::mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        let id = Uuid::new_v4();
        let (handle, rx, _task) = spawn_session(id, self.resolver.clone(), self.speed_range);
        self.sessions.insert(id, handle.clone());
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
        tracing::info!("Session {} opened ({} live)", id, self.sessions.len());
        (handle, rx)
    }

    /// Stop and unregister a session
    pub fn close_session(&self, id: Uuid) {
        if let Some((_, handle)) = self.sessions.remove(&id) {
            handle.shutdown();
            tracing::info!("Session {} closed ({} live)", id, self.sessions.len());
        }
    }

    pub fn get_session(&self, id: &Uuid) -> Option<PlaybackHandle> {
        self.sessions.get(id).map(|r| r.clone())
    }

    /// Snapshots of all live sessions, oldest first
    pub fn session_snapshots(&self) -> Vec<SessionSnapshot> {
        let mut snapshots: Vec<SessionSnapshot> =
            self.sessions.iter().map(|r| r.snapshot()).collect();
        snapshots.sort_by_key(|s| s.connected_at);
        snapshots
    }
}
