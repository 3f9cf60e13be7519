//! Engine error types
//!
//! None of these are fatal. The session handles each one locally.

use thiserror::Error;

use super::text::TextRange;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Selection was collapsed, empty, or outside the rendering
    #[error("Selection could not be mapped onto the document")]
    MappingFailed,

    /// A new annotation would intersect an existing anchor
    #[error("Range {}..{} overlaps annotation {conflicting}", .range.start, .range.end)]
    OverlapRejected {
        range: TextRange,
        conflicting: String,
    },

    /// Annotation could not be located in the current rendering
    #[error("Annotation {0} could not be anchored")]
    AnchorLost(String),
}

impl EngineError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::MappingFailed => "mapping_failed",
            EngineError::OverlapRejected { .. } => "overlap_rejected",
            EngineError::AnchorLost(_) => "anchor_lost",
        }
    }
}
