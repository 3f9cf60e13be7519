//! Range reconciliation
//!
//! Re-anchors persisted annotations against the current flattened text.
//! A stored range is trusted when it still fits the text; otherwise the
//! quoted snippet is searched for literally. Repeated identical snippets
//! claim successive occurrences in insertion order.

use std::collections::HashMap;

use serde::Serialize;

use super::error::EngineError;
use super::text::{FlatText, TextRange};
use crate::annotations::Annotation;

/// A validated annotation interval for one render pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anchor {
    pub start: usize,
    pub end: usize,
    pub id: String,
}

impl Anchor {
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Anchors in annotation insertion order
    pub anchors: Vec<Anchor>,
    /// Annotations that could not be anchored in this pass
    pub orphaned: Vec<String>,
}

/// Resolves annotation positions against one flattened text.
///
/// Holds the per-literal search cursor, so one resolver must be used for a
/// whole pass and fed annotations in insertion order.
pub struct AnchorResolver<'a> {
    text: &'a FlatText,
    cursors: HashMap<String, usize>,
}

impl<'a> AnchorResolver<'a> {
    pub fn new(text: &'a FlatText) -> Self {
        Self {
            text,
            cursors: HashMap::new(),
        }
    }

    /// Resolve one annotation, or `None` if it cannot be anchored
    pub fn resolve(&mut self, annotation: &Annotation) -> Option<TextRange> {
        match annotation.range {
            Some(range) if self.fits(&range) => trim_whitespace(self.text, range),
            _ => self.find_literal(&annotation.selected_text),
        }
    }

    fn fits(&self, range: &TextRange) -> bool {
        range.start < range.end && range.end <= self.text.len()
    }

    fn find_literal(&mut self, literal: &str) -> Option<TextRange> {
        let needle: Vec<char> = literal.chars().collect();
        if needle.is_empty() {
            return None;
        }

        let from = self.cursors.get(literal).copied().unwrap_or(0);
        let start = self.text.find(&needle, from)?;
        let end = start + needle.len();
        self.cursors.insert(literal.to_string(), end);

        Some(TextRange::new(start, end))
    }
}

/// Move both ends of `range` inward past whitespace.
/// Returns `None` when nothing but whitespace remains.
pub fn trim_whitespace(text: &FlatText, range: TextRange) -> Option<TextRange> {
    let mut start = range.start;
    let mut end = range.end;

    while start < end && text.char_at(start).is_some_and(char::is_whitespace) {
        start += 1;
    }
    while end > start && text.char_at(end - 1).is_some_and(char::is_whitespace) {
        end -= 1;
    }

    (end > start).then(|| TextRange::new(start, end))
}

/// Compute anchors for every annotation that can be located
pub fn reconcile(annotations: &[Annotation], text: &FlatText) -> Vec<Anchor> {
    reconcile_report(annotations, text).anchors
}

/// Like [`reconcile`], but also reports which annotations were lost
pub fn reconcile_report(annotations: &[Annotation], text: &FlatText) -> Reconciliation {
    let mut resolver = AnchorResolver::new(text);
    let mut result = Reconciliation::default();

    for annotation in annotations {
        match resolver.resolve(annotation) {
            Some(range) => result.anchors.push(Anchor {
                start: range.start,
                end: range.end,
                id: annotation.id.clone(),
            }),
            None => {
                let lost = EngineError::AnchorLost(annotation.id.clone());
                tracing::debug!(kind = lost.kind(), "{}", lost);
                result.orphaned.push(annotation.id.clone());
            }
        }
    }

    result
}
