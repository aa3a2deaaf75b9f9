//! Word-index builder
//!
//! Splits the input into whitespace and non-whitespace runs in one pass and
//! produces the character timeline, the character-to-word map and the
//! fragments of the highlighted-word display.

use serde::Serialize;
use std::sync::OnceLock;

use super::render::escape_html;

fn whitespace_runs() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\s+").unwrap())
}

/// One run of the word display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    /// Whitespace, shown as raw text
    Text { text: String },
    /// A word unit addressable by its index
    Word { index: usize, text: String },
}

impl Fragment {
    pub fn to_html(&self) -> String {
        match self {
            Fragment::Text { text } => escape_html(text),
            Fragment::Word { index, text } => format!(
                r#"<span id="{}" class="word-span">{}</span>"#,
                word_element_id(*index),
                escape_html(text)
            ),
        }
    }
}

/// DOM id of a word unit
pub fn word_element_id(index: usize) -> String {
    format!("word-{}", index)
}

/// Timeline, word map and display fragments for one conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordLayout {
    /// Uppercase-normalized symbols, one per input character
    pub timeline: Vec<char>,
    /// Owning word of each timeline position, `None` for whitespace
    pub char_to_word: Vec<Option<usize>>,
    pub fragments: Vec<Fragment>,
    pub word_count: usize,
}

impl WordLayout {
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn word_at(&self, position: usize) -> Option<usize> {
        self.char_to_word.get(position).copied().flatten()
    }

    /// Word map in its wire form, `-1` marking whitespace
    pub fn char_to_word_wire(&self) -> Vec<i64> {
        self.char_to_word
            .iter()
            .map(|w| w.map(|i| i as i64).unwrap_or(-1))
            .collect()
    }

    pub fn to_html(&self) -> String {
        self.fragments.iter().map(Fragment::to_html).collect()
    }

    fn push_whitespace(&mut self, run: &str) {
        for symbol in run.chars() {
            self.timeline.push(symbol);
            self.char_to_word.push(None);
        }
        self.fragments.push(Fragment::Text {
            text: run.to_string(),
        });
    }

    fn push_word(&mut self, run: &str) {
        let index = self.word_count;
        for symbol in run.chars() {
            self.timeline.push(symbol);
            self.char_to_word.push(Some(index));
        }
        self.fragments.push(Fragment::Word {
            index,
            text: run.to_string(),
        });
        self.word_count += 1;
    }
}

/// Uppercase one character, keeping it when the uppercase form is not a
/// single character so positions stay aligned with the input.
fn normalize_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Build the layout for `text`
pub fn build(text: &str) -> WordLayout {
    let normalized: String = text.chars().map(normalize_char).collect();
    let mut layout = WordLayout::default();

    let mut cursor = 0;
    for run in whitespace_runs().find_iter(&normalized) {
        if run.start() > cursor {
            layout.push_word(&normalized[cursor..run.start()]);
        }
        layout.push_whitespace(run.as_str());
        cursor = run.end();
    }
    if cursor < normalized.len() {
        layout.push_word(&normalized[cursor..]);
    }

    layout
}
