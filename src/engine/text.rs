//! Rendered document model
//!
//! The engine never sees markup. A rendering is an ordered list of text
//! runs, and the flattened text is their concatenation in render order.
//! All offsets are counted in characters (Unicode scalar values).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identifier of a text run within one rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(pub u32);

/// Half-open character interval `[start, end)` over the flattened text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Standard half-open intersection test
    pub fn intersects(&self, other: &TextRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Whether `other` lies entirely inside this interval
    pub fn covers(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Flattened document text with character-indexed access
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatText {
    text: String,
    chars: Vec<char>,
}

impl FlatText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = text.chars().collect();
        Self { text, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Copy out the characters of `range`, clamped to the text
    pub fn slice(&self, range: TextRange) -> String {
        let end = range.end.min(self.chars.len());
        let start = range.start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// Forward literal search for `needle`, starting at character `from`
    pub fn find(&self, needle: &[char], from: usize) -> Option<usize> {
        if needle.is_empty() || from > self.chars.len() {
            return None;
        }
        self.chars[from..]
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|pos| pos + from)
    }

    /// Offsets of the first character of every line
    pub fn line_starts(&self) -> Vec<usize> {
        let mut starts = vec![0];
        for (i, c) in self.chars.iter().enumerate() {
            if *c == '\n' {
                starts.push(i + 1);
            }
        }
        starts
    }
}

impl From<&str> for FlatText {
    fn from(text: &str) -> Self {
        FlatText::new(text)
    }
}

impl From<String> for FlatText {
    fn from(text: String) -> Self {
        FlatText::new(text)
    }
}

/// A visible text run placed in the flattened text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub id: RunId,
    pub text: String,
    /// Offset of the run's first character in the flattened text
    pub start: usize,
    /// Length in characters
    pub len: usize,
}

impl TextRun {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end())
    }
}

/// One rendering of a document, as consumed by the mapper and compositor
#[derive(Debug, Clone, Default)]
pub struct RenderedDocument {
    runs: Vec<TextRun>,
    index: HashMap<RunId, usize>,
    flat: FlatText,
}

impl RenderedDocument {
    /// Build a rendering from run texts, assigning sequential run ids
    pub fn from_runs<I, S>(runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_ids(
            runs.into_iter()
                .enumerate()
                .map(|(i, text)| (RunId(i as u32), text.into())),
        )
    }

    /// Build a rendering from runs carrying host-assigned ids
    pub fn with_ids<I>(runs: I) -> Self
    where
        I: IntoIterator<Item = (RunId, String)>,
    {
        let mut placed = Vec::new();
        let mut index = HashMap::new();
        let mut flat = String::new();
        let mut cumulative = 0;

        for (id, text) in runs {
            let len = text.chars().count();
            flat.push_str(&text);
            index.insert(id, placed.len());
            placed.push(TextRun {
                id,
                text,
                start: cumulative,
                len,
            });
            cumulative += len;
        }

        Self {
            runs: placed,
            index,
            flat: FlatText::new(flat),
        }
    }

    /// Treat plain text as a rendering with one run per line.
    /// Line breaks stay attached to the end of their line.
    pub fn from_text(text: &str) -> Self {
        Self::from_runs(text.split_inclusive('\n'))
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn run(&self, id: RunId) -> Option<&TextRun> {
        self.index.get(&id).map(|&i| &self.runs[i])
    }

    /// Position of a run in render order
    pub fn run_position(&self, id: RunId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn flat(&self) -> &FlatText {
        &self.flat
    }

    pub fn text(&self) -> &str {
        self.flat.as_str()
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }
}
