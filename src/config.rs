//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Sign clip assets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Directory served under `/static`
    pub static_dir: PathBuf,

    /// URL prefix of the per-symbol clips
    pub url_prefix: String,

    /// File extension of the clips
    pub extension: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("static"),
            url_prefix: "/static/hand_videos".to_string(),
            extension: "mp4".to_string(),
        }
    }
}

impl AssetConfig {
    /// Directory on disk that holds the clips, derived from `url_prefix`
    /// when it points below `/static`.
    pub fn clip_dir(&self) -> Option<PathBuf> {
        self.url_prefix
            .strip_prefix("/static")
            .map(|rest| self.static_dir.join(rest.trim_matches('/')))
    }
}

/// Speed slider configuration, in milliseconds per symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial slider value
    pub default_speed_ms: u32,

    /// Fastest setting
    pub min_speed_ms: u32,

    /// Slowest setting
    pub max_speed_ms: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_speed_ms: 1000,
            min_speed_ms: 100,
            max_speed_ms: 2000,
        }
    }
}

/// External transcription service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Endpoint that accepts a multipart `video` field; uploads are
    /// rejected when unset
    pub endpoint: Option<String>,

    /// Maximum upload size in megabytes
    pub max_upload_mb: usize,

    /// Accepted video file extensions
    pub allowed_extensions: Vec<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_upload_mb: 500,
            allowed_extensions: ["mp4", "avi", "mov", "mkv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: 600,
        }
    }
}

impl TranscriptionConfig {
    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    pub assets: AssetConfig,

    pub playback: PlaybackConfig,

    pub transcription: TranscriptionConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            assets: AssetConfig::default(),
            playback: PlaybackConfig::default(),
            transcription: TranscriptionConfig::default(),
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
