//! Highlight composition
//!
//! Splits every text run into segments so that each segment is covered by
//! exactly one set of annotations. The result is a plain value; applying it
//! to a view is the renderer's job.
//!
//! Anchors are normally disjoint because of the overlap guard, but legacy
//! data or drift can make them intersect, so segments may carry several ids.

use serde::Serialize;

use super::reconcile::Anchor;
use super::text::{RenderedDocument, RunId, TextRange};

/// How a segment should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStyle {
    Plain,
    /// Covered by one annotation
    Single,
    /// Covered by several annotations
    Multiple,
    /// Part of the uncommitted selection
    Draft,
}

/// A piece of one run sharing a single set of covering annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Ids of the anchors fully covering this segment, in anchor order
    pub ids: Vec<String>,
    /// Covered by the draft selection
    pub draft: bool,
}

impl Segment {
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }

    pub fn style(&self) -> SegmentStyle {
        match self.ids.len() {
            0 if self.draft => SegmentStyle::Draft,
            0 => SegmentStyle::Plain,
            1 => SegmentStyle::Single,
            _ => SegmentStyle::Multiple,
        }
    }

    fn same_tags(&self, other: &Segment) -> bool {
        self.ids == other.ids && self.draft == other.draft
    }
}

/// Segments of one run, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSegments {
    pub run: RunId,
    pub segments: Vec<Segment>,
}

/// Composed highlights for a whole rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Composition {
    runs: Vec<RunSegments>,
}

impl Composition {
    pub fn runs(&self) -> &[RunSegments] {
        &self.runs
    }

    pub fn run(&self, id: RunId) -> Option<&RunSegments> {
        self.runs.iter().find(|r| r.run == id)
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.runs.iter().flat_map(|r| r.segments.iter())
    }

    /// Segments that carry any highlight
    pub fn highlighted(&self) -> impl Iterator<Item = &Segment> {
        self.segments().filter(|s| s.style() != SegmentStyle::Plain)
    }

    /// Annotation ids under a point of interaction, for edit re-entry.
    /// `offset` is local to the run.
    pub fn annotations_at(&self, run: RunId, offset: usize) -> &[String] {
        let Some(run_segments) = self.run(run) else {
            return &[];
        };
        let Some(first) = run_segments.segments.first() else {
            return &[];
        };

        let flat_offset = first.start + offset;
        run_segments
            .segments
            .iter()
            .find(|s| s.start <= flat_offset && flat_offset < s.end)
            .map(|s| s.ids.as_slice())
            .unwrap_or(&[])
    }
}

/// Compose committed anchors and an optional draft selection into segments
pub fn compose(
    doc: &RenderedDocument,
    anchors: &[Anchor],
    draft: Option<TextRange>,
) -> Composition {
    let draft = draft.filter(|d| !d.is_empty());

    let mut breakpoints: Vec<usize> = anchors
        .iter()
        .flat_map(|a| [a.start, a.end])
        .chain(draft.iter().flat_map(|d| [d.start, d.end]))
        .collect();
    breakpoints.sort_unstable();
    breakpoints.dedup();

    let runs = doc
        .runs()
        .iter()
        .map(|run| {
            let run_range = run.range();
            let mut segments = Vec::new();

            if run.len == 0 {
                return RunSegments {
                    run: run.id,
                    segments,
                };
            }

            let touched = anchors.iter().any(|a| a.range().intersects(&run_range))
                || draft.is_some_and(|d| d.intersects(&run_range));

            if !touched {
                segments.push(Segment {
                    start: run.start,
                    end: run.end(),
                    text: run.text.clone(),
                    ids: Vec::new(),
                    draft: false,
                });
                return RunSegments {
                    run: run.id,
                    segments,
                };
            }

            let mut cuts = vec![run.start];
            cuts.extend(
                breakpoints
                    .iter()
                    .copied()
                    .filter(|&b| b > run.start && b < run.end()),
            );
            cuts.push(run.end());

            for pair in cuts.windows(2) {
                let range = TextRange::new(pair[0], pair[1]);
                let segment = tag_segment(doc, anchors, draft, range);

                match segments.last_mut() {
                    Some(prev) if prev.same_tags(&segment) => {
                        prev.end = segment.end;
                        prev.text.push_str(&segment.text);
                    }
                    _ => segments.push(segment),
                }
            }

            RunSegments {
                run: run.id,
                segments,
            }
        })
        .collect();

    Composition { runs }
}

fn tag_segment(
    doc: &RenderedDocument,
    anchors: &[Anchor],
    draft: Option<TextRange>,
    range: TextRange,
) -> Segment {
    let text = doc.flat().slice(range);

    // Invisible characters are never highlighted
    if text.chars().all(char::is_whitespace) {
        return Segment {
            start: range.start,
            end: range.end,
            text,
            ids: Vec::new(),
            draft: false,
        };
    }

    let ids = anchors
        .iter()
        .filter(|a| a.range().covers(&range))
        .map(|a| a.id.clone())
        .collect();

    Segment {
        start: range.start,
        end: range.end,
        text,
        ids,
        draft: draft.is_some_and(|d| d.covers(&range)),
    }
}
