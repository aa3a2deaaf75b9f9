//! Sequencer / timing engine
//!
//! Walks the character timeline one symbol at a time. Each step shows one
//! unit and installs exactly one trigger: the clip's end for video symbols,
//! a timer of the slider delay for everything else. Whatever fires calls
//! [`Sequencer::advance`] with the ticket it was issued; triggers whose
//! ticket no longer matches the pending one are stale and ignored, so a
//! superseded conversion can never step the current one.
//!
//! The sequencer does not own a clock. The caller turns [`Step::Wait`] into
//! a real timer or clip listener and feeds the resulting [`Trigger`] back.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::highlight::HighlightTracker;
use super::render::{self, VisualUnit};
use super::speed::SpeedFactor;
use super::stage::Stage;
use super::symbol::SymbolResolver;
use super::words::{self, WordLayout};

/// Shown instead of playback when the input is empty
pub const EMPTY_INPUT_NOTICE: &str = "Please enter some text to convert.";

/// Identifies the step a trigger was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub session: u64,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Media,
    Timer,
}

/// The one trigger a session is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub ticket: Ticket,
    pub kind: TriggerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The clip played to its end
    MediaEnded(Ticket),
    /// The clip could not be loaded
    MediaFailed(Ticket),
    TimerElapsed(Ticket),
}

impl Trigger {
    pub fn ticket(&self) -> Ticket {
        match self {
            Trigger::MediaEnded(t) | Trigger::MediaFailed(t) | Trigger::TimerElapsed(t) => *t,
        }
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::MediaEnded(_) | Trigger::MediaFailed(_) => TriggerKind::Media,
            Trigger::TimerElapsed(_) => TriggerKind::Timer,
        }
    }
}

/// What the caller has to install for the next step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Wait for the shown clip to end or fail
    Media(Ticket),
    /// Fire [`Trigger::TimerElapsed`] after the delay
    Delay(Ticket, Duration),
}

impl Wait {
    pub fn ticket(&self) -> Ticket {
        match self {
            Wait::Media(t) | Wait::Delay(t, _) => *t,
        }
    }
}

/// Outcome of `start` / `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Wait(Wait),
    /// Nothing to play
    Idle,
    Done,
    /// Stale or unexpected trigger, nothing changed
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "position", rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Playing(usize),
    Done,
}

/// One conversion, from `start` to done
#[derive(Debug)]
pub struct PlaybackSession {
    id: u64,
    layout: WordLayout,
    position: usize,
    pending: Option<Pending>,
}

impl PlaybackSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn layout(&self) -> &WordLayout {
        &self.layout
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

pub struct Sequencer<S: Stage> {
    stage: S,
    resolver: SymbolResolver,
    speed: SpeedFactor,
    highlight: HighlightTracker,
    session: Option<PlaybackSession>,
    state: PlaybackState,
    media_active: bool,
    sessions_started: u64,
}

impl<S: Stage> Sequencer<S> {
    pub fn new(stage: S, resolver: SymbolResolver, speed: SpeedFactor) -> Self {
        Self {
            stage,
            resolver,
            speed,
            highlight: HighlightTracker::new(),
            session: None,
            state: PlaybackState::Idle,
            media_active: false,
            sessions_started: 0,
        }
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn speed(&self) -> SpeedFactor {
        self.speed
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn pending(&self) -> Option<Pending> {
        self.session.as_ref().and_then(|s| s.pending)
    }

    pub fn highlighted_word(&self) -> Option<usize> {
        self.highlight.current()
    }

    /// Change the speed. Steps already scheduled keep their delay; the new
    /// value applies from the next scheduled step on.
    pub fn set_speed(&mut self, speed: SpeedFactor) {
        debug!(value = speed.value(), "speed changed");
        self.speed = speed;
    }

    /// Drop the pending trigger, releasing the active clip.
    pub fn cancel(&mut self) -> Option<Pending> {
        let pending = self.session.as_mut().and_then(|s| s.pending.take());
        self.release_media_if_active();
        if let Some(p) = pending {
            debug!(
                session = p.ticket.session,
                position = p.ticket.position,
                kind = ?p.kind,
                "cancelled pending trigger"
            );
        }
        pending
    }

    /// Begin a new conversion, superseding any in flight.
    pub fn start(&mut self, text: &str) -> Step {
        self.cancel();

        let layout = words::build(text);
        self.highlight.reset();
        self.stage.show_words(&layout);

        if layout.is_empty() {
            self.session = None;
            self.state = PlaybackState::Idle;
            self.stage.show(render::render_notice(EMPTY_INPUT_NOTICE));
            debug!("empty input, nothing to play");
            return Step::Idle;
        }

        self.sessions_started += 1;
        let id = self.sessions_started;
        info!(
            session = id,
            symbols = layout.len(),
            words = layout.word_count,
            "starting conversion"
        );
        self.session = Some(PlaybackSession {
            id,
            layout,
            position: 0,
            pending: None,
        });
        self.step()
    }

    /// Feed a fired trigger back into the state machine.
    pub fn advance(&mut self, trigger: Trigger) -> Step {
        let Some(session) = self.session.as_mut() else {
            debug!(?trigger, "trigger without a session");
            return Step::Ignored;
        };
        let expected = session.pending;
        let matches = expected
            .map(|p| p.ticket == trigger.ticket() && p.kind == trigger.kind())
            .unwrap_or(false);
        if !matches {
            debug!(?trigger, ?expected, "ignoring stale trigger");
            return Step::Ignored;
        }

        match trigger {
            Trigger::MediaFailed(ticket) => {
                let symbol = session.layout.timeline[ticket.position];
                warn!("Video missing for: {}", symbol);
                session.pending = Some(Pending {
                    ticket,
                    kind: TriggerKind::Timer,
                });
                self.release_media_if_active();
                Step::Wait(Wait::Delay(ticket, self.speed.delay()))
            }
            Trigger::MediaEnded(_) | Trigger::TimerElapsed(_) => {
                session.pending = None;
                session.position += 1;
                self.step()
            }
        }
    }

    fn release_media_if_active(&mut self) {
        if self.media_active {
            self.stage.release_media();
            self.media_active = false;
        }
    }

    fn step(&mut self) -> Step {
        self.release_media_if_active();

        let Some(session) = self.session.as_mut() else {
            return Step::Idle;
        };
        let position = session.position;

        if position >= session.layout.len() {
            session.pending = None;
            self.state = PlaybackState::Done;
            self.stage.show(render::render_done());
            self.highlight.update(None, &mut self.stage);
            info!(session = session.id, "conversion finished");
            return Step::Done;
        }

        let symbol = session.layout.timeline[position];
        let ticket = Ticket {
            session: session.id,
            position,
        };
        self.state = PlaybackState::Playing(position);
        self.highlight
            .update(session.layout.word_at(position), &mut self.stage);

        let descriptor = self.resolver.resolve(symbol);
        let unit: VisualUnit = render::render(symbol, &descriptor, self.speed, ticket);
        debug!(session = session.id, position, ?symbol, "step");
        self.stage.show(unit);

        if descriptor.is_video() {
            self.media_active = true;
            session.pending = Some(Pending {
                ticket,
                kind: TriggerKind::Media,
            });
            Step::Wait(Wait::Media(ticket))
        } else {
            session.pending = Some(Pending {
                ticket,
                kind: TriggerKind::Timer,
            });
            Step::Wait(Wait::Delay(ticket, self.speed.delay()))
        }
    }
}
