//! Per-viewer playback session
//!
//! Each connected viewer gets one task that owns a [`Sequencer`]. All
//! inputs (viewer messages, timer expiry, transcription results) arrive as
//! [`Command`]s on one channel and are handled in order, so the sequencer
//! is never touched concurrently. At most one timer task exists per
//! session; it is aborted whenever a new step is scheduled or a new
//! conversion starts.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::protocol::{ClientMessage, ServerMessage};
use super::stage::ChannelStage;
use crate::sign::{
    PlaybackState, Sequencer, SpeedRange, SpeedSummary, Step, SymbolResolver, Ticket, Trigger,
    Wait,
};

/// Shown in the text input while an upload is being transcribed
pub const PROCESSING_PLACEHOLDER: &str = "Processing video... please wait...";

#[derive(Debug)]
pub enum Command {
    Client(ClientMessage),
    TimerElapsed(Ticket),
    /// An upload for this session is being transcribed; lock the input
    BeginTranscription,
    /// Transcript or user-facing error message
    FinishTranscription(Result<String, String>),
    Shutdown,
}

/// Point-in-time view of a session for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub connected_at: DateTime<Utc>,
    pub playback: PlaybackState,
    pub speed: SpeedSummary,
    pub input_locked: bool,
    pub conversions: u64,
}

/// Cheap handle used to drive a session from outside its task
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    id: Uuid,
    tx: mpsc::UnboundedSender<Command>,
    snapshot: Arc<Mutex<SessionSnapshot>>,
}

impl PlaybackHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns false once the session task has exited
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn client(&self, message: ClientMessage) -> bool {
        self.send(Command::Client(message))
    }

    pub fn begin_transcription(&self) -> bool {
        self.send(Command::BeginTranscription)
    }

    pub fn finish_transcription(&self, result: Result<String, String>) -> bool {
        self.send(Command::FinishTranscription(result))
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.lock().clone()
    }
}

/// Spawn a session task.
///
/// Returns the handle, the stream of messages for the viewer (starting
/// with `hello`) and the task's join handle.
pub fn spawn_session(
    id: Uuid,
    resolver: SymbolResolver,
    range: SpeedRange,
) -> (
    PlaybackHandle,
    mpsc::UnboundedReceiver<ServerMessage>,
    JoinHandle<()>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    let speed = range.initial();
    let stage = ChannelStage::new(out_tx);
    stage.send(ServerMessage::Hello {
        session: id,
        speed: speed.summary(),
        min_speed_ms: range.min,
        max_speed_ms: range.max,
    });

    let snapshot = Arc::new(Mutex::new(SessionSnapshot {
        id,
        connected_at: Utc::now(),
        playback: PlaybackState::Idle,
        speed: speed.summary(),
        input_locked: false,
        conversions: 0,
    }));

    let actor = PlaybackActor {
        id,
        sequencer: Sequencer::new(stage, resolver, speed),
        range,
        commands: command_tx.clone(),
        timer: None,
        transcriptions: 0,
        conversions: 0,
        last_state: PlaybackState::Idle,
        snapshot: Arc::clone(&snapshot),
    };
    let task = tokio::spawn(actor.run(command_rx));

    let handle = PlaybackHandle {
        id,
        tx: command_tx,
        snapshot,
    };
    (handle, out_rx, task)
}

struct PlaybackActor {
    id: Uuid,
    sequencer: Sequencer<ChannelStage>,
    range: SpeedRange,
    /// Used by timer tasks to report back
    commands: mpsc::UnboundedSender<Command>,
    timer: Option<(Ticket, JoinHandle<()>)>,
    /// Outstanding uploads; input is locked while non-zero
    transcriptions: u32,
    conversions: u64,
    last_state: PlaybackState,
    snapshot: Arc<Mutex<SessionSnapshot>>,
}

impl PlaybackActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!(session = %self.id, "playback session started");

        while let Some(command) = commands.recv().await {
            if let Command::Shutdown = command {
                break;
            }
            self.handle(command);
            self.publish_snapshot();
        }

        self.cancel_timer();
        self.sequencer.cancel();
        debug!(session = %self.id, "playback session closed");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Client(ClientMessage::Convert { text }) => {
                if self.input_locked() {
                    warn!(session = %self.id, "ignoring convert while a transcription is in progress");
                } else {
                    self.start(&text);
                }
            }
            Command::Client(ClientMessage::SetSpeed { value }) => {
                let speed = self.range.clamp(value);
                self.sequencer.set_speed(speed);
                self.send(ServerMessage::Speed {
                    speed: speed.summary(),
                });
            }
            Command::Client(ClientMessage::MediaEnded { ticket }) => {
                self.advance(Trigger::MediaEnded(ticket));
            }
            Command::Client(ClientMessage::MediaFailed { ticket }) => {
                self.advance(Trigger::MediaFailed(ticket));
            }
            Command::TimerElapsed(ticket) => {
                if matches!(self.timer, Some((current, _)) if current == ticket) {
                    self.timer = None;
                }
                self.advance(Trigger::TimerElapsed(ticket));
            }
            Command::BeginTranscription => {
                self.transcriptions += 1;
                if self.transcriptions == 1 {
                    self.send(ServerMessage::InputLocked { locked: true });
                    self.send(ServerMessage::Transcript {
                        text: PROCESSING_PLACEHOLDER.to_string(),
                    });
                }
            }
            Command::FinishTranscription(result) => {
                self.transcriptions = self.transcriptions.saturating_sub(1);
                let unlock = !self.input_locked();
                match result {
                    Ok(text) => {
                        if unlock {
                            self.send(ServerMessage::InputLocked { locked: false });
                        }
                        self.send(ServerMessage::Transcript { text: text.clone() });
                        self.start(&text);
                    }
                    Err(message) => {
                        self.send(ServerMessage::Alert { message });
                        if unlock {
                            self.send(ServerMessage::Transcript {
                                text: String::new(),
                            });
                            self.send(ServerMessage::InputLocked { locked: false });
                        }
                    }
                }
            }
            Command::Shutdown => {}
        }
    }

    fn input_locked(&self) -> bool {
        self.transcriptions > 0
    }

    fn send(&self, message: ServerMessage) {
        self.sequencer.stage().send(message);
    }

    fn start(&mut self, text: &str) {
        self.cancel_timer();
        self.conversions += 1;
        info!(session = %self.id, chars = text.chars().count(), "convert requested");
        let step = self.sequencer.start(text);
        self.schedule(step);
    }

    fn advance(&mut self, trigger: Trigger) {
        let step = self.sequencer.advance(trigger);
        self.schedule(step);
    }

    fn schedule(&mut self, step: Step) {
        match step {
            Step::Ignored => return,
            Step::Wait(Wait::Delay(ticket, delay)) => self.arm_timer(ticket, delay),
            Step::Wait(Wait::Media(_)) | Step::Idle | Step::Done => self.cancel_timer(),
        }

        let state = self.sequencer.state();
        if state != self.last_state {
            self.last_state = state;
            self.send(ServerMessage::Status { playback: state });
        }
    }

    fn arm_timer(&mut self, ticket: Ticket, delay: Duration) {
        self.cancel_timer();
        let commands = self.commands.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = commands.send(Command::TimerElapsed(ticket));
        });
        self.timer = Some((ticket, task));
    }

    fn cancel_timer(&mut self) {
        if let Some((ticket, task)) = self.timer.take() {
            task.abort();
            debug!(session = %self.id, position = ticket.position, "timer cancelled");
        }
    }

    fn publish_snapshot(&self) {
        let mut snapshot = self.snapshot.lock();
        snapshot.playback = self.sequencer.state();
        snapshot.speed = self.sequencer.speed().summary();
        snapshot.input_locked = self.input_locked();
        snapshot.conversions = self.conversions;
    }
}
