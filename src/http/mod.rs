//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with all endpoints
//! - WebSocket playback sessions
//! - Video upload for transcription
//! - Static clip assets
//! - CORS middleware

pub mod handlers;
pub mod routes;
pub mod socket;
pub mod upload;

pub use routes::create_router;
