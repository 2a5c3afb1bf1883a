//! # slope-core
//!
//! Accessibility slope compliance for pedestrian paths over a DEM.
//!
//! The crate turns a decoded elevation band into slope and aspect fields,
//! densifies path geometries, evaluates running and cross slope at every
//! sample, and reduces the results into pass/fail statistics:
//!
//! ```text
//!   RasterBand ─► ElevationGrid ─► GradientField ─► RasterComplianceSummary
//!                                       │
//!   PathGeometry ─► SamplePoint[] ──────┴─► SlopeSample[] ─► SegmentResult
//! ```
//!
//! Inputs must already share one projected, metre-based coordinate system.
//! Nothing here reads files or touches the network; every call owns its data,
//! so independent analyses can run on separate threads.
//!
//! ```
//! use slope_core::{analyze, AnalysisConfig, ElevationGrid, GeoTransform, PathGeometry, RasterBand};
//!
//! // 50×50 grid, 1 m pixels, rising 8% towards the east.
//! let data = (0..50 * 50).map(|i| (i % 50) as f32 * 0.08).collect();
//! let band = RasterBand { data, width: 50, height: 50, transform: GeoTransform::unit(50), nodata: None };
//! let paths = [PathGeometry::new("ramp", [(5.0, 25.0), (45.0, 25.0)])];
//!
//! let report = analyze(band, &paths, &AnalysisConfig::default())?;
//! assert!(!report.raster.pass);
//! assert_eq!(report.paths[0].verdict.passes(), Some(false));
//! # Ok::<(), slope_core::SlopeError>(())
//! ```

pub mod analysis;
pub mod angles;
pub mod classifier;
pub mod config;
mod error;
pub mod evaluator;
pub mod gradient;
pub mod grid;
pub mod sampler;

pub use analysis::{analyze, analyze_grid, analyze_raster, ComplianceReport};
pub use classifier::{classify_path, classify_raster, RasterComplianceSummary, SegmentResult, SegmentVerdict};
pub use config::{AnalysisConfig, CellLookup, ComplianceThresholds, OutOfBoundsPolicy, RunningSlopeMode, SamplePlacement};
pub use error::SlopeError;
pub use evaluator::{SlopeEvaluator, SlopeSample, UndefinedReason};
pub use gradient::{compute_gradient, GradientField};
pub use grid::{BandSource, ElevationGrid, GeoTransform, RasterBand};
pub use sampler::{densify, PathGeometry, SamplePoint, Vertex};

/// Result type for slope analysis.
pub type Result<T> = std::result::Result<T, SlopeError>;
