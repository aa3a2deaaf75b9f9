//! Configuration file support
//!
//! Loads server configuration from TOML files. Every section except
//! `[server]` may be omitted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{AssetConfig, PlaybackConfig, ServerConfig, TranscriptionConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Clip asset settings
    pub assets: Option<AssetSettings>,
    /// Speed slider settings
    pub playback: Option<PlaybackSettings>,
    /// Transcription service settings
    pub transcription: Option<TranscriptionSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSettings {
    pub static_dir: Option<PathBuf>,
    pub url_prefix: Option<String>,
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub default_speed_ms: Option<u32>,
    pub min_speed_ms: Option<u32>,
    pub max_speed_ms: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Upstream endpoint URL
    pub endpoint: Option<String>,
    /// Maximum upload size in MB
    pub max_upload_mb: Option<usize>,
    pub allowed_extensions: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let defaults = ServerConfig::default();
        Self {
            server: ServerSettings {
                host: defaults.host,
                port: defaults.port,
                cors_enabled: Some(defaults.cors_enabled),
            },
            assets: Some(AssetSettings {
                static_dir: Some(defaults.assets.static_dir),
                url_prefix: Some(defaults.assets.url_prefix),
                extension: Some(defaults.assets.extension),
            }),
            playback: Some(PlaybackSettings {
                default_speed_ms: Some(defaults.playback.default_speed_ms),
                min_speed_ms: Some(defaults.playback.min_speed_ms),
                max_speed_ms: Some(defaults.playback.max_speed_ms),
            }),
            transcription: Some(TranscriptionSettings {
                endpoint: Some("http://127.0.0.1:9000/transcribe".to_string()),
                max_upload_mb: Some(defaults.transcription.max_upload_mb),
                allowed_extensions: Some(defaults.transcription.allowed_extensions),
                timeout_secs: Some(defaults.transcription.timeout_secs),
            }),
            logging: Some(LoggingSettings {
                level: defaults.log_level,
                format: Some(defaults.log_format),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();

        let assets = match self.assets {
            Some(a) => AssetConfig {
                static_dir: a.static_dir.unwrap_or(defaults.assets.static_dir),
                url_prefix: a.url_prefix.unwrap_or(defaults.assets.url_prefix),
                extension: a.extension.unwrap_or(defaults.assets.extension),
            },
            None => defaults.assets,
        };

        let playback = match self.playback {
            Some(p) => PlaybackConfig {
                default_speed_ms: p
                    .default_speed_ms
                    .unwrap_or(defaults.playback.default_speed_ms),
                min_speed_ms: p.min_speed_ms.unwrap_or(defaults.playback.min_speed_ms),
                max_speed_ms: p.max_speed_ms.unwrap_or(defaults.playback.max_speed_ms),
            },
            None => defaults.playback,
        };

        let transcription = match self.transcription {
            Some(t) => TranscriptionConfig {
                endpoint: t.endpoint.filter(|e| !e.trim().is_empty()),
                max_upload_mb: t
                    .max_upload_mb
                    .unwrap_or(defaults.transcription.max_upload_mb),
                allowed_extensions: t
                    .allowed_extensions
                    .unwrap_or(defaults.transcription.allowed_extensions),
                timeout_secs: t
                    .timeout_secs
                    .unwrap_or(defaults.transcription.timeout_secs),
            },
            None => defaults.transcription,
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            assets,
            playback,
            transcription,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level: self
                .logging
                .as_ref()
                .map(|l| l.level.clone())
                .unwrap_or(defaults.log_level),
            log_format: self
                .logging
                .and_then(|l| l.format)
                .unwrap_or(defaults.log_format),
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
