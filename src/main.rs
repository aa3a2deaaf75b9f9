//! Sign Player
//!
//! Serves a text-to-sign player: each connected viewer gets a playback
//! session that walks the text symbol by symbol, shows the matching
//! hand-sign clip, and keeps the current word highlighted. Text can also
//! come from an uploaded video via an external transcription service.

#![allow(dead_code)]

mod config;
mod config_file;
mod error;
mod http;
mod playback;
mod sign;
mod state;
mod transcribe;

use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::config_file::{generate_default_config, ConfigFile};
use crate::error::{Result, SignError};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "sign-player";

#[derive(Parser, Debug)]
#[command(name = "sign-player")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(default_value = "config.toml")]
    config: PathBuf,

    /// Print a default configuration file to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Write a default configuration file to this path and exit
    #[arg(long)]
    write_default_config: Option<PathBuf>,
}

/// How the configuration was obtained
#[derive(Debug, PartialEq)]
enum ConfigSource {
    File,
    Missing,
    Invalid(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        let text = toml::to_string_pretty(&ConfigFile::default_config())
            .map_err(|e| SignError::Config(e.to_string()))?;
        print!("{}", text);
        return Ok(());
    }

    if let Some(path) = cli.write_default_config {
        generate_default_config(&path).map_err(|e| SignError::Config(e.to_string()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let (config, source) = load_config(&cli.config);

    // Initialize logging
    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    match source {
        ConfigSource::File => {
            tracing::info!("Loaded configuration from {}", cli.config.display())
        }
        ConfigSource::Missing => tracing::info!(
            "Config file {} not found, using defaults",
            cli.config.display()
        ),
        ConfigSource::Invalid(e) => tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
    }
    tracing::info!("Configuration loaded: {:?}", config);

    // Create application state
    let state = Arc::new(
        AppState::new(config.clone()).map_err(|e| SignError::Config(e.to_string()))?,
    );
    match &state.transcriber {
        Some(client) => tracing::info!("Transcription service: {}", client.endpoint()),
        None => tracing::info!("No transcription endpoint configured, uploads are disabled"),
    }
    report_missing_clips(&state);

    // Build router
    let app = create_router(state.clone());

    // Start server
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| SignError::Config(format!("invalid listen address: {}", e)))?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load the config file, falling back to defaults
fn load_config(path: &Path) -> (ServerConfig, ConfigSource) {
    if !path.exists() {
        return (ServerConfig::default(), ConfigSource::Missing);
    }
    match ConfigFile::from_file(path) {
        Ok(cf) => (cf.into_server_config(), ConfigSource::File),
        Err(e) => (ServerConfig::default(), ConfigSource::Invalid(e.to_string())),
    }
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let json = config.log_format.eq_ignore_ascii_case("json");
    let default_filter = format!(
        "sign_player={},tower_http={}",
        config.log_level, config.log_level
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Missing clips are not fatal, viewers fall back to a timed step
fn report_missing_clips(state: &AppState) {
    let Some(dir) = state.config.assets.clip_dir() else {
        return;
    };
    let missing = state.resolver.missing_assets(&dir);
    if missing.is_empty() {
        tracing::info!("All sign clips present in {}", dir.display());
    } else {
        tracing::warn!(
            "{} sign clip(s) missing from {}: {}",
            missing.len(),
            dir.display(),
            missing.iter().collect::<String>()
        );
    }
}
