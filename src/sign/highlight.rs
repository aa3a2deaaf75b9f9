//! Highlight tracker
//!
//! Keeps the currently highlighted word and only touches the display when
//! the word actually changes.

/// Something that can mark a word unit as highlighted
pub trait HighlightTarget {
    fn set_highlight(&mut self, word: usize, on: bool);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HighlightTracker {
    current: Option<usize>,
}

impl HighlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Move the highlight to `next`. Returns false when nothing changed.
    pub fn update<T: HighlightTarget + ?Sized>(&mut self, next: Option<usize>, target: &mut T) -> bool {
        if next == self.current {
            return false;
        }
        if let Some(previous) = self.current {
            target.set_highlight(previous, false);
        }
        if let Some(word) = next {
            target.set_highlight(word, true);
        }
        self.current = next;
        true
    }

    /// Forget the current word without touching the display; used when the
    /// word units themselves are replaced.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
