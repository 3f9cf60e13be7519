//! Annotation anchoring engine
//!
//! Pure, synchronous building blocks for placing annotations on a rendered
//! document:
//!
//! - `mapper`: selection boundary points to flattened-text intervals
//! - `reconcile`: stored annotations to validated anchors, with literal
//!   search when a stored range no longer fits
//! - `overlap`: insertion-time intersection guard
//! - `compositor`: anchors to per-run highlight segments
//! - `export`: annotations to a markdown feedback digest

pub mod compositor;
pub mod error;
pub mod export;
pub mod mapper;
pub mod overlap;
pub mod reconcile;
pub mod text;

pub use compositor::{compose, Composition, RunSegments, Segment, SegmentStyle};
pub use error::EngineError;
pub use export::{generate_feedback, ExportSettings};
pub use mapper::{map_selection, BoundaryPoint, Selection};
pub use overlap::{check_overlap, has_overlap};
pub use reconcile::{reconcile, reconcile_report, Anchor, AnchorResolver, Reconciliation};
pub use text::{FlatText, RenderedDocument, RunId, TextRange, TextRun};
