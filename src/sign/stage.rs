//! Display surface the sequencer writes to

use super::highlight::HighlightTarget;
use super::render::VisualUnit;
use super::words::WordLayout;

/// A display with one sign slot and a word display.
///
/// Implementations only draw; all timing decisions stay in the sequencer.
pub trait Stage: HighlightTarget {
    /// Replace the word display with the fragments of a new layout
    fn show_words(&mut self, layout: &WordLayout);

    /// Replace the unit in the sign slot
    fn show(&mut self, unit: VisualUnit);

    /// Pause the active clip and detach its source
    fn release_media(&mut self);
}
