//! Running and cross slope at path sample points.
//!
//! ```text
//!   running = slope_pct                              (gradient_magnitude)
//!           = |gx·sin(b) + gy·cos(b)| · 100          (along_path)
//!   cross   = slope_pct · |sin(aspect − b)|
//! ```
//!
//! where `b` is the sample bearing. A sample outside the grid, or on a cell
//! whose gradient is NaN, is [`SlopeSample::Undefined`]; nothing here fails.

use serde::{Deserialize, Serialize};

use crate::angles;
use crate::config::{CellLookup, RunningSlopeMode};
use crate::gradient::GradientField;
use crate::grid::ElevationGrid;
use crate::sampler::SamplePoint;

/// Why a sample has no slope value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    OutOfBounds,
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlopeSample {
    Defined {
        running_slope_pct: f64,
        cross_slope_pct: f64,
        aspect_deg: f64,
    },
    Undefined {
        reason: UndefinedReason,
    },
}

impl SlopeSample {
    pub fn is_defined(&self) -> bool {
        matches!(self, SlopeSample::Defined { .. })
    }
}

/// Local surface at a position: gradient plus derived slope and aspect.
struct Surface {
    gx: f64,
    gy: f64,
    slope_pct: f64,
    aspect_deg: f64,
}

/// Reads a gradient field at world positions with one fixed lookup mode.
pub struct SlopeEvaluator<'a> {
    grid: &'a ElevationGrid,
    field: &'a GradientField,
    lookup: CellLookup,
    running: RunningSlopeMode,
}

impl<'a> SlopeEvaluator<'a> {
    pub fn new(grid: &'a ElevationGrid, field: &'a GradientField, lookup: CellLookup, running: RunningSlopeMode) -> Self {
        Self { grid, field, lookup, running }
    }

    pub fn evaluate(&self, point: &SamplePoint) -> SlopeSample {
        let surface = match self.lookup {
            CellLookup::Nearest => self.nearest(point.x, point.y),
            CellLookup::Bilinear => self.bilinear(point.x, point.y),
        };
        let s = match surface {
            Ok(s) => s,
            Err(reason) => return SlopeSample::Undefined { reason },
        };

        let running_slope_pct = match self.running {
            RunningSlopeMode::GradientMagnitude => s.slope_pct,
            RunningSlopeMode::AlongPath => angles::directional_derivative(s.gx, s.gy, point.bearing_deg).abs() * 100.0,
        };
        SlopeSample::Defined {
            running_slope_pct,
            cross_slope_pct: s.slope_pct * angles::cross_factor(s.aspect_deg, point.bearing_deg),
            aspect_deg: s.aspect_deg,
        }
    }

    pub fn evaluate_all(&self, points: &[SamplePoint]) -> Vec<SlopeSample> {
        points.iter().map(|p| self.evaluate(p)).collect()
    }

    fn nearest(&self, x: f64, y: f64) -> Result<Surface, UndefinedReason> {
        let (r, c) = self.grid.cell_at(x, y).ok_or(UndefinedReason::OutOfBounds)?;
        let (gx, gy) = self.field.gradient(r, c);
        let slope_pct = self.field.slope_pct_at(r, c);
        if !slope_pct.is_finite() {
            return Err(UndefinedReason::NoData);
        }
        Ok(Surface { gx, gy, slope_pct, aspect_deg: self.field.aspect_at(r, c) })
    }

    fn bilinear(&self, x: f64, y: f64) -> Result<Surface, UndefinedReason> {
        let (col, row) = self.grid.pixel_position(x, y).ok_or(UndefinedReason::OutOfBounds)?;
        let (w, h) = (self.field.width, self.field.height);

        // Cell centres sit at half-pixel offsets; the outer half pixel
        // clamps to the border cells.
        let fx = (col - 0.5).clamp(0.0, (w - 1) as f64);
        let fy = (row - 0.5).clamp(0.0, (h - 1) as f64);
        let c0 = fx.floor() as usize;
        let r0 = fy.floor() as usize;
        let c1 = (c0 + 1).min(w - 1);
        let r1 = (r0 + 1).min(h - 1);
        let tx = fx - c0 as f64;
        let ty = fy - r0 as f64;

        let blend = |values: &[f64]| {
            let at = |r: usize, c: usize| values[r * w + c];
            at(r0, c0) * (1.0 - tx) * (1.0 - ty)
                + at(r0, c1) * tx * (1.0 - ty)
                + at(r1, c0) * (1.0 - tx) * ty
                + at(r1, c1) * tx * ty
        };
        let gx = blend(self.field.gradient_x.as_slice());
        let gy = blend(self.field.gradient_y.as_slice());
        if !(gx.is_finite() && gy.is_finite()) {
            return Err(UndefinedReason::NoData);
        }
        Ok(Surface { gx, gy, slope_pct: gx.hypot(gy) * 100.0, aspect_deg: angles::aspect_deg(gx, gy) })
    }
}
