//! Playback sessions
//!
//! Runs the sign sequencer for a connected viewer:
//! - JSON protocol spoken over the WebSocket
//! - A stage that forwards drawing to the viewer
//! - The session task that owns timers and feeds triggers back

pub mod actor;
pub mod protocol;
pub mod stage;

pub use actor::{spawn_session, Command, PlaybackHandle, SessionSnapshot, PROCESSING_PLACEHOLDER};
pub use protocol::{ClientMessage, ServerMessage};
pub use stage::ChannelStage;
