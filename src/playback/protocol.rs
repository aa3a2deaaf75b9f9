//! Wire protocol between a viewer and its playback session
//!
//! JSON text frames tagged by `type`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sign::{Fragment, PlaybackState, SpeedSummary, Ticket, VisualUnit};

/// Viewer -> server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start converting `text`, superseding any playback in progress
    Convert { text: String },
    /// New slider value in ms per symbol
    SetSpeed { value: u32 },
    /// The clip shown for `ticket` played to its end
    MediaEnded { ticket: Ticket },
    /// The clip shown for `ticket` failed to load
    MediaFailed { ticket: Ticket },
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Server -> viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Hello {
        session: Uuid,
        speed: SpeedSummary,
        min_speed_ms: u32,
        max_speed_ms: u32,
    },
    /// New word display; `char_to_word` uses -1 for whitespace
    Words {
        fragments: Vec<Fragment>,
        char_to_word: Vec<i64>,
        html: String,
    },
    /// Replace the sign slot
    Show { unit: VisualUnit, html: String },
    Highlight { word: usize, on: bool },
    /// Pause the current clip and detach its source
    ReleaseMedia,
    Speed { speed: SpeedSummary },
    Status { playback: PlaybackState },
    InputLocked { locked: bool },
    /// Replace the text input contents
    Transcript { text: String },
    /// One-shot notification for the user
    Alert { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
