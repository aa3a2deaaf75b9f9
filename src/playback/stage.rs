//! Stage that forwards drawing to a viewer over a channel

use tokio::sync::mpsc;
use tracing::trace;

use super::protocol::ServerMessage;
use crate::sign::{HighlightTarget, Stage, VisualUnit, WordLayout};

#[derive(Debug, Clone)]
pub struct ChannelStage {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ChannelStage {
    pub fn new(tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { tx }
    }

    pub fn send(&self, message: ServerMessage) {
        if self.tx.send(message).is_err() {
            trace!("viewer channel closed, dropping message");
        }
    }
}

impl HighlightTarget for ChannelStage {
    fn set_highlight(&mut self, word: usize, on: bool) {
        self.send(ServerMessage::Highlight { word, on });
    }
}

impl Stage for ChannelStage {
    fn show_words(&mut self, layout: &WordLayout) {
        self.send(ServerMessage::Words {
            fragments: layout.fragments.clone(),
            char_to_word: layout.char_to_word_wire(),
            html: layout.to_html(),
        });
    }

    fn show(&mut self, unit: VisualUnit) {
        let html = unit.to_html();
        self.send(ServerMessage::Show { unit, html });
    }

    fn release_media(&mut self) {
        self.send(ServerMessage::ReleaseMedia);
    }
}
