//! Presentation renderer
//!
//! Turns a resolved symbol into the single unit shown in the display slot.
//! A unit is plain data plus an HTML fragment, so the sequencer has no
//! dependency on whatever draws it.

use serde::Serialize;

use super::sequencer::Ticket;
use super::speed::SpeedFactor;
use super::symbol::SignDescriptor;

/// How a clip is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaOptions {
    pub muted: bool,
    pub autoplay: bool,
    pub inline: bool,
    pub controls: bool,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            muted: true,
            autoplay: true,
            inline: true,
            controls: false,
        }
    }
}

/// Content of the display slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualUnit {
    /// A playing clip. The viewer reports `ended` / `error` back with `ticket`.
    Video {
        symbol: char,
        src: String,
        playback_rate: f64,
        media: MediaOptions,
        ticket: Ticket,
    },
    Space,
    /// A symbol without a sign
    Unsupported { symbol: char },
    /// End of playback
    Done,
    /// A message instead of a sign
    Notice { message: String },
}

const CHECK_MARK_SVG: &str = r#"<svg class="done-glyph" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M5 13l4 4L19 7"></path></svg>"#;

impl VisualUnit {
    /// Caption shown under the unit
    pub fn label(&self) -> String {
        match self {
            VisualUnit::Video { symbol, .. } | VisualUnit::Unsupported { symbol } => {
                symbol.to_string()
            }
            VisualUnit::Space => "(Space)".to_string(),
            VisualUnit::Done => "Done".to_string(),
            VisualUnit::Notice { message } => message.clone(),
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, VisualUnit::Video { .. })
    }

    pub fn to_html(&self) -> String {
        match self {
            VisualUnit::Video {
                src,
                playback_rate,
                media,
                ticket,
                ..
            } => {
                let mut attrs = String::new();
                if media.autoplay {
                    attrs.push_str(" autoplay");
                }
                if media.muted {
                    attrs.push_str(" muted");
                }
                if media.inline {
                    attrs.push_str(" playsinline");
                }
                if media.controls {
                    attrs.push_str(" controls");
                }
                wrap_unit(
                    "sign-unit",
                    &format!(
                        r#"<video src="{}"{} data-playback-rate="{}" data-session="{}" data-position="{}"></video>"#,
                        escape_html(src),
                        attrs,
                        playback_rate,
                        ticket.session,
                        ticket.position
                    ),
                    &escape_html(&self.label()),
                )
            }
            VisualUnit::Space => wrap_unit(
                "sign-unit sign-space",
                r#"<span class="space-label">(Space)</span>"#,
                "(Space)",
            ),
            VisualUnit::Unsupported { .. } => wrap_unit(
                "sign-unit sign-unsupported",
                r#"<span class="unsupported-glyph">?</span>"#,
                &escape_html(&self.label()),
            ),
            VisualUnit::Done => wrap_unit("sign-unit sign-done", CHECK_MARK_SVG, ""),
            VisualUnit::Notice { message } => {
                format!(r#"<p class="sign-notice">{}</p>"#, escape_html(message))
            }
        }
    }
}

fn wrap_unit(class: &str, content: &str, caption: &str) -> String {
    format!(
        r#"<div class="{}"><div class="sign-content">{}</div><p class="sign-caption">{}</p></div>"#,
        class, content, caption
    )
}

/// Render the unit for one symbol
pub fn render(
    symbol: char,
    descriptor: &SignDescriptor,
    speed: SpeedFactor,
    ticket: Ticket,
) -> VisualUnit {
    match descriptor {
        SignDescriptor::Video { src } => VisualUnit::Video {
            symbol,
            src: src.clone(),
            playback_rate: speed.rate(),
            media: MediaOptions::default(),
            ticket,
        },
        SignDescriptor::Space => VisualUnit::Space,
        SignDescriptor::Unsupported => VisualUnit::Unsupported { symbol },
    }
}

pub fn render_done() -> VisualUnit {
    VisualUnit::Done
}

pub fn render_notice(message: impl Into<String>) -> VisualUnit {
    VisualUnit::Notice {
        message: message.into(),
    }
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
