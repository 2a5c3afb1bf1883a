//! Compliance thresholds and analysis options, loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::error::SlopeError;
use crate::Result;

/// Accessibility slope limits, in percent rise over run.
/// Defaults are the ADA limits: 5% running, 2.083% (1:48) cross.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceThresholds {
    pub running_max_pct: f64,
    pub cross_max_pct: f64,
}

impl Default for ComplianceThresholds {
    fn default() -> Self {
        Self {
            running_max_pct: 5.0,
            cross_max_pct: 2.083,
        }
    }
}

impl ComplianceThresholds {
    pub fn validate(&self) -> Result<()> {
        positive("running_max_pct", self.running_max_pct)?;
        positive("cross_max_pct", self.cross_max_pct)
    }
}

/// How gradient fields are read at a sample position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellLookup {
    /// Value of the cell containing the point.
    #[default]
    Nearest,
    /// Bilinear blend of the gradient components at the four surrounding
    /// cell centres.
    Bilinear,
}

/// Where path samples are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplePlacement {
    /// At every densified point, endpoints included.
    #[default]
    Vertices,
    /// At the midpoint of each pair of consecutive densified points.
    Midpoints,
}

/// Definition of running slope at a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningSlopeMode {
    /// Full local gradient magnitude, regardless of travel direction.
    /// Overstates running slope where a path crosses contours obliquely.
    #[default]
    GradientMagnitude,
    /// Absolute directional derivative along the sample bearing.
    AlongPath,
}

/// What to do with a sample outside the grid extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfBoundsPolicy {
    /// Drop it from the aggregates and count it.
    #[default]
    Exclude,
    /// Fail the whole analysis with [`SlopeError::OutOfBounds`].
    Abort,
}

/// Parameters of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub thresholds: ComplianceThresholds,
    /// Path densification interval in metres.
    pub sample_interval_m: f64,
    pub lookup: CellLookup,
    pub placement: SamplePlacement,
    pub running_slope: RunningSlopeMode,
    pub out_of_bounds: OutOfBoundsPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: ComplianceThresholds::default(),
            sample_interval_m: 2.0,
            lookup: CellLookup::default(),
            placement: SamplePlacement::default(),
            running_slope: RunningSlopeMode::default(),
            out_of_bounds: OutOfBoundsPolicy::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        positive("sample_interval_m", self.sample_interval_m)
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SlopeError::Config(format!("{name} must be a positive number, got {value}")))
    }
}
