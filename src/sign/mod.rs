//! Sign playback core
//!
//! Everything needed to turn text into a timed sequence of sign units:
//! - Symbol resolution (character -> clip / space / unsupported)
//! - Word indexing for the highlighted-word display
//! - Rendering of the single visible unit
//! - The sequencer state machine and its highlight tracker
//!
//! Nothing here knows about sockets, timers or HTML pages beyond the
//! fragments the renderer emits.

pub mod highlight;
pub mod render;
pub mod sequencer;
pub mod speed;
pub mod stage;
pub mod symbol;
pub mod words;

pub use highlight::{HighlightTarget, HighlightTracker};
pub use render::{render, render_done, render_notice, MediaOptions, VisualUnit};
pub use sequencer::{
    PlaybackState, Pending, Sequencer, Step, Ticket, Trigger, TriggerKind, Wait,
    EMPTY_INPUT_NOTICE,
};
pub use speed::{SpeedFactor, SpeedRange, SpeedSummary, BASE_MS};
pub use stage::Stage;
pub use symbol::{SignDescriptor, SymbolResolver};
pub use words::{build, Fragment, WordLayout};
