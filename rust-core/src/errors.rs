use thiserror::Error;

use crate::interfaces::GrainId;

/// Errors raised by the twin-merge library
#[derive(Debug, Error)]
pub enum TwinMergeError {
    #[error("map of {height}x{width} pixels needs {expected} values, got {actual}")]
    ShapeMismatch {
        height: usize,
        width: usize,
        expected: usize,
        actual: usize,
    },

    #[error("map of {height}x{width} pixels does not fit in memory")]
    ShapeOverflow { height: usize, width: usize },

    #[error("orientation map is {orientation_shape:?} but grain map is {grain_shape:?}")]
    MapShapeMismatch {
        grain_shape: (usize, usize),
        orientation_shape: (usize, usize),
    },

    #[error("invalid orientation: {0}")]
    InvalidOrientation(String),

    #[error("invalid symmetry operator set: {0}")]
    InvalidSymmetry(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A twin pair referenced a grain that is not present in the grain map
    #[error("unknown grain id {0}")]
    UnknownGrainId(GrainId),

    /// The broadcast writer found a grain without a precomputed mean
    #[error("incomplete mean orientation table: no entry for grain {0}")]
    IncompleteMeanOrientationTable(GrainId),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
