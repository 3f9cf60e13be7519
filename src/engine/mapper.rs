//! Selection to offset mapping
//!
//! Converts a host selection (two boundary points, possibly reversed) into a
//! forward-ordered interval over the flattened text.

use serde::{Deserialize, Serialize};

use super::text::{RenderedDocument, RunId, TextRange};

/// A position inside one text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryPoint {
    pub run: RunId,
    /// Character offset within the run
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(run: RunId, offset: usize) -> Self {
        Self { run, offset }
    }
}

/// A captured selection. `anchor` is where the user started,
/// `focus` where they ended; either may come first in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: BoundaryPoint,
    pub focus: BoundaryPoint,
}

impl Selection {
    pub fn new(anchor: BoundaryPoint, focus: BoundaryPoint) -> Self {
        Self { anchor, focus }
    }
}

/// Map a selection onto the flattened text.
///
/// Returns `None` when the selection is collapsed or when either point lies
/// outside the rendering.
pub fn map_selection(doc: &RenderedDocument, selection: &Selection) -> Option<TextRange> {
    let anchor = locate(doc, &selection.anchor)?;
    let focus = locate(doc, &selection.focus)?;

    // Document order is (run position, offset)
    let (start, end) = if anchor > focus {
        (focus, anchor)
    } else {
        (anchor, focus)
    };

    let start = canonical_offset(doc, start);
    let end = canonical_offset(doc, end);

    if start == end {
        return None;
    }
    Some(TextRange::new(start, end))
}

/// Interval between two fixed points, e.g. the edges of an existing highlight
pub fn range_of_points(
    doc: &RenderedDocument,
    start: BoundaryPoint,
    end: BoundaryPoint,
) -> Option<TextRange> {
    map_selection(doc, &Selection::new(start, end))
}

/// Build a synthetic selection spanning `range`, for re-opening an
/// annotation without a live selection.
pub fn selection_for_range(doc: &RenderedDocument, range: TextRange) -> Option<Selection> {
    let anchor = point_at(doc, range.start)?;
    let focus = point_at(doc, range.end)?;
    Some(Selection::new(anchor, focus))
}

/// Boundary point for a flattened offset. An offset on a run boundary
/// resolves to the start of the later run; the document end resolves to the
/// end of the last run.
pub fn point_at(doc: &RenderedDocument, offset: usize) -> Option<BoundaryPoint> {
    let runs = doc.runs();
    if let Some(run) = runs
        .iter()
        .find(|run| run.start <= offset && offset < run.end())
    {
        return Some(BoundaryPoint::new(run.id, offset - run.start));
    }

    let last = runs.last()?;
    (offset == last.end()).then(|| BoundaryPoint::new(last.id, last.len))
}

/// Resolve a point to (run position, offset), rejecting points outside the root
fn locate(doc: &RenderedDocument, point: &BoundaryPoint) -> Option<(usize, usize)> {
    let position = doc.run_position(point.run)?;
    let run = &doc.runs()[position];
    (point.offset <= run.len).then_some((position, point.offset))
}

/// Flattened offset of a located point
fn canonical_offset(doc: &RenderedDocument, (position, offset): (usize, usize)) -> usize {
    doc.runs()[position].start + offset
}
