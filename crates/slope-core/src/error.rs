//! Error types for slope analysis.

use thiserror::Error;

/// Errors that abort an analysis.
///
/// Out-of-bounds and nodata samples are normally recorded per point and
/// excluded from aggregates; they only surface here under
/// [`OutOfBoundsPolicy::Abort`](crate::config::OutOfBoundsPolicy::Abort).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlopeError {
    /// Empty, all-nodata or malformed elevation grid, or bad pixel spacing.
    #[error("invalid elevation data: {0}")]
    Data(String),

    /// Path with fewer than two distinct, finite vertices.
    #[error("degenerate geometry for path '{path_id}': {reason}")]
    DegenerateGeometry {
        /// Identifier of the offending path.
        path_id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Sample point outside the grid extent.
    #[error("sample ({x:.3}, {y:.3}) on path '{path_id}' lies outside the elevation grid")]
    OutOfBounds {
        /// Identifier of the path the sample belongs to.
        path_id: String,
        /// Sample x coordinate.
        x: f64,
        /// Sample y coordinate.
        y: f64,
    },

    /// Non-positive or non-finite threshold or sampling interval.
    #[error("invalid configuration: {0}")]
    Config(String),
}
